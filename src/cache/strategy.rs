//! Cache Strategy Module
//!
//! The capability set every cache backend offers to the cache-aside service.

use crate::cache::{CacheItem, StoreStats};

// == Cache Strategy ==
/// A bounded in-memory cache backend.
///
/// Implementations are internally synchronized and never wait on I/O, so
/// every method is synchronous and callable from async tasks.
pub trait CacheStrategy: Send + Sync {
    /// Looks up a key, refreshing its recency and access metadata on a hit.
    ///
    /// Expired items are dropped and reported as misses.
    fn get(&self, key: &str) -> Option<CacheItem>;

    /// Inserts or replaces the item stored under `key`.
    ///
    /// Items larger than the byte budget are silently not cached.
    fn set(&self, key: &str, item: CacheItem);

    /// Deletes `key` if present. Counters are unaffected.
    fn remove(&self, key: &str) -> bool;

    /// Drops every expired item and returns how many were removed.
    fn cleanup(&self) -> usize;

    /// Current number of live items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point-in-time counters.
    fn stats(&self) -> StoreStats;

    /// Presence probe that honors TTL without touching recency or counters.
    fn contains(&self, key: &str) -> bool;
}
