//! Moka Store Module
//!
//! Alternative backend delegating byte-budget eviction and expiration to
//! `moka`. The cache runs moka's LRU policy so a new item is always admitted
//! and the least recently used ones make room. moka bounds a single weighted
//! capacity, so the item-count budget is enforced here before each insert.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheItem, CacheStrategy, StoreStats};

#[derive(Debug)]
struct Access {
    last: DateTime<Utc>,
    count: u64,
    /// Logical clock value of the latest set or hit
    tick: u64,
}

#[derive(Debug)]
struct Entry {
    item: CacheItem,
    access: Mutex<Access>,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

// == Moka Store ==
/// Byte- and count-bounded cache backed by `moka::sync::Cache`.
///
/// `len` and `stats` lag behind writes until `cleanup` runs moka's
/// pending maintenance.
pub struct MokaStore {
    cache: Cache<String, Arc<Entry>>,
    counters: Arc<Counters>,
    capacity_bytes: u64,
    max_items: usize,
    clock: AtomicU64,
    /// Serializes the count check with the insert that follows it
    admission: Mutex<()>,
}

impl MokaStore {
    // == Constructor ==
    /// Creates a new MokaStore.
    ///
    /// # Arguments
    /// * `capacity_bytes` - Maximum sum of payload sizes
    /// * `max_items` - Maximum number of items; 0 makes every set a no-op
    /// * `ttl` - Expiration age; `Duration::ZERO` disables expiration
    pub fn new(capacity_bytes: u64, max_items: usize, ttl: Duration) -> Self {
        let counters = Arc::new(Counters::default());
        let listener_counters = Arc::clone(&counters);

        let mut builder = Cache::builder()
            .max_capacity(capacity_bytes)
            .eviction_policy(EvictionPolicy::lru())
            .weigher(|_key: &String, entry: &Arc<Entry>| -> u32 {
                u32::try_from(entry.item.size_bytes()).unwrap_or(u32::MAX)
            })
            .eviction_listener(move |key: Arc<String>, _entry: Arc<Entry>, cause: RemovalCause| {
                match cause {
                    RemovalCause::Size => {
                        listener_counters.evictions.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %key, "Evicted");
                    }
                    RemovalCause::Expired => {
                        listener_counters.expirations.fetch_add(1, Ordering::Relaxed);
                    }
                    _ => {}
                }
            });
        if !ttl.is_zero() {
            builder = builder.time_to_live(ttl);
        }

        Self {
            cache: builder.build(),
            counters,
            capacity_bytes,
            max_items,
            clock: AtomicU64::new(0),
            admission: Mutex::new(()),
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Evicts least recently used items until one more fits under `max_items`.
    fn make_room(&self) {
        self.cache.run_pending_tasks();
        let live = self.cache.entry_count() as usize;
        if live < self.max_items {
            return;
        }

        let mut by_age: Vec<(u64, Arc<String>)> = self
            .cache
            .iter()
            .map(|(key, entry)| (entry.access.lock().tick, key))
            .collect();
        by_age.sort_unstable_by_key(|(tick, _)| *tick);

        for (_, key) in by_age.into_iter().take(live + 1 - self.max_items) {
            if self.cache.remove(key.as_str()).is_some() {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Evicted");
            }
        }
    }
}

impl CacheStrategy for MokaStore {
    fn get(&self, key: &str) -> Option<CacheItem> {
        match self.cache.get(key) {
            Some(entry) => {
                let mut access = entry.access.lock();
                access.last = Utc::now();
                access.count += 1;
                access.tick = self.tick();

                let mut item = entry.item.clone();
                item.last_access = access.last;
                item.access_count = access.count;
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(item)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, key: &str, mut item: CacheItem) {
        if self.max_items == 0 {
            return;
        }
        if item.size_bytes() > self.capacity_bytes {
            debug!(key, size = item.size_bytes(), "Item not cacheable, skipping");
            return;
        }

        let _admission = self.admission.lock();
        if !self.cache.contains_key(key) {
            self.make_room();
        }

        item.key = key.to_string();
        let access = Access {
            last: item.last_access,
            count: item.access_count,
            tick: self.tick(),
        };
        self.cache.insert(
            key.to_string(),
            Arc::new(Entry {
                item,
                access: Mutex::new(access),
            }),
        );
    }

    fn remove(&self, key: &str) -> bool {
        self.cache.remove(key).is_some()
    }

    fn cleanup(&self) -> usize {
        let before = self.counters.expirations.load(Ordering::Relaxed);
        self.cache.run_pending_tasks();
        let after = self.counters.expirations.load(Ordering::Relaxed);
        (after - before) as usize
    }

    fn len(&self) -> usize {
        self.cache.entry_count() as usize
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            item_count: self.cache.entry_count() as usize,
            total_bytes: self.cache.weighted_size(),
            hit_count: self.counters.hits.load(Ordering::Relaxed),
            miss_count: self.counters.misses.load(Ordering::Relaxed),
            eviction_count: self.counters.evictions.load(Ordering::Relaxed),
            expired_count: self.counters.expirations.load(Ordering::Relaxed),
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }
}
