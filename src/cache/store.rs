//! LRU Store Module
//!
//! Main cache engine combining a key index with an arena-backed recency
//! list, a byte budget, an item-count budget and optional TTL expiration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::cache::lru::{Handle, RecencyList};
use crate::cache::{CacheItem, CacheStrategy, StoreStats};

// == Node ==
/// A live item plus the monotonic insertion time used for TTL.
#[derive(Debug)]
struct Node {
    item: CacheItem,
    inserted_at: Instant,
}

impl Node {
    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match ttl {
            Some(ttl) => now.saturating_duration_since(self.inserted_at) > ttl,
            None => false,
        }
    }
}

// == Inner State ==
/// Everything guarded by the store lock. Index and list are only ever
/// mutated together through `insert_front` and `remove_handle`.
#[derive(Debug, Default)]
struct Inner {
    index: HashMap<String, Handle>,
    list: RecencyList<Node>,
    current_bytes: u64,
    stats: StoreStats,
}

impl Inner {
    fn insert_front(&mut self, key: &str, item: CacheItem) {
        self.current_bytes += item.size_bytes();
        let handle = self.list.push_front(Node {
            item,
            inserted_at: Instant::now(),
        });
        self.index.insert(key.to_string(), handle);
    }

    fn remove_handle(&mut self, handle: Handle) -> Option<CacheItem> {
        let node = self.list.remove(handle)?;
        self.index.remove(&node.item.key);
        self.current_bytes -= node.item.size_bytes();
        Some(node.item)
    }

    fn remove_key(&mut self, key: &str) -> Option<CacheItem> {
        let handle = self.index.get(key).copied()?;
        self.remove_handle(handle)
    }

    fn evict_oldest(&mut self) -> Option<CacheItem> {
        let node = self.list.pop_back()?;
        self.index.remove(&node.item.key);
        self.current_bytes -= node.item.size_bytes();
        self.stats.record_eviction();
        Some(node.item)
    }
}

// == LRU Store ==
/// Size- and count-bounded LRU store with optional TTL.
///
/// All state lives behind one lock. `get` mutates recency order and
/// counters, so it takes the write lock like every other mutation.
#[derive(Debug)]
pub struct LruStore {
    inner: RwLock<Inner>,
    /// Maximum total payload bytes
    capacity_bytes: u64,
    /// Maximum number of live items
    max_items: usize,
    /// Expiration age, None = never expires
    ttl: Option<Duration>,
}

impl LruStore {
    // == Constructor ==
    /// Creates a new LruStore.
    ///
    /// # Arguments
    /// * `capacity_bytes` - Maximum sum of payload sizes
    /// * `max_items` - Maximum number of live items
    /// * `ttl` - Expiration age; `Duration::ZERO` disables expiration
    pub fn new(capacity_bytes: u64, max_items: usize, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity_bytes,
            max_items,
            ttl: (!ttl.is_zero()).then_some(ttl),
        }
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        let inner = self.inner.read();
        inner
            .list
            .iter()
            .map(|(_, node)| node.item.key.clone())
            .collect()
    }

    /// Checks that index, list and byte counter agree.
    #[cfg(test)]
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        let inner = self.inner.read();
        let mut seen = std::collections::HashSet::new();
        let mut bytes = 0u64;

        for (handle, node) in inner.list.iter() {
            let key = &node.item.key;
            if !seen.insert(key.clone()) {
                return Err(format!("key '{}' appears twice in the list", key));
            }
            if inner.index.get(key) != Some(&handle) {
                return Err(format!("index entry for '{}' does not match its node", key));
            }
            bytes += node.item.size_bytes();
        }

        if seen.len() != inner.index.len() || seen.len() != inner.list.len() {
            return Err(format!(
                "list walk saw {} keys, index has {}, list reports {}",
                seen.len(),
                inner.index.len(),
                inner.list.len()
            ));
        }
        if bytes != inner.current_bytes {
            return Err(format!(
                "current_bytes is {} but live items sum to {}",
                inner.current_bytes, bytes
            ));
        }
        Ok(())
    }
}

impl CacheStrategy for LruStore {
    // == Get ==
    fn get(&self, key: &str) -> Option<CacheItem> {
        let mut inner = self.inner.write();

        let Some(handle) = inner.index.get(key).copied() else {
            inner.stats.record_miss();
            return None;
        };

        let expired = inner
            .list
            .get(handle)
            .is_some_and(|node| node.is_expired(self.ttl, Instant::now()));
        if expired {
            inner.remove_handle(handle);
            inner.stats.record_expiration();
            inner.stats.record_miss();
            debug!(key, "Expired on read");
            return None;
        }

        inner.list.touch(handle);
        let item = inner.list.get_mut(handle).map(|node| {
            node.item.record_access();
            node.item.clone()
        });
        inner.stats.record_hit();
        item
    }

    // == Set ==
    fn set(&self, key: &str, mut item: CacheItem) {
        let size = item.size_bytes();

        // Never let one item flush the whole cache.
        if size > self.capacity_bytes || self.max_items == 0 {
            debug!(key, size, capacity = self.capacity_bytes, "Item not cacheable, skipping");
            return;
        }

        let mut inner = self.inner.write();
        inner.remove_key(key);

        while inner.current_bytes + size > self.capacity_bytes || inner.list.len() >= self.max_items {
            match inner.evict_oldest() {
                Some(evicted) => debug!(key = %evicted.key, size = evicted.size_bytes(), "Evicted"),
                None => break,
            }
        }
        debug_assert!(inner.current_bytes + size <= self.capacity_bytes);
        debug_assert!(inner.list.len() < self.max_items);

        item.key = key.to_string();
        inner.insert_front(key, item);
    }

    // == Remove ==
    fn remove(&self, key: &str) -> bool {
        self.inner.write().remove_key(key).is_some()
    }

    // == Cleanup ==
    fn cleanup(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let mut inner = self.inner.write();
        let now = Instant::now();
        let expired: Vec<Handle> = inner
            .list
            .iter()
            .filter(|(_, node)| node.is_expired(self.ttl, now))
            .map(|(handle, _)| handle)
            .collect();

        for &handle in &expired {
            if inner.remove_handle(handle).is_some() {
                inner.stats.record_expiration();
            }
        }
        expired.len()
    }

    // == Length ==
    fn len(&self) -> usize {
        self.inner.read().list.len()
    }

    // == Stats ==
    fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            item_count: inner.list.len(),
            total_bytes: inner.current_bytes,
            ..inner.stats.clone()
        }
    }

    // == Contains ==
    fn contains(&self, key: &str) -> bool {
        let inner = self.inner.read();
        inner
            .index
            .get(key)
            .and_then(|&handle| inner.list.get(handle))
            .is_some_and(|node| !node.is_expired(self.ttl, Instant::now()))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread::{self, sleep};

    const NO_TTL: Duration = Duration::ZERO;

    fn blob(key: &str, size: usize) -> CacheItem {
        CacheItem::new(key, vec![0u8; size], "application/octet-stream")
    }

    #[test]
    fn test_store_new() {
        let store = LruStore::new(1024, 10, Duration::from_secs(60));
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.ttl(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_ttl_disables_expiration() {
        let store = LruStore::new(1024, 10, NO_TTL);
        assert_eq!(store.ttl(), None);
    }

    #[test]
    fn test_store_set_and_get() {
        let store = LruStore::new(1024, 10, NO_TTL);

        store.set("key1", CacheItem::new("key1", "value1", "text/plain"));
        let item = store.get("key1").unwrap();

        assert_eq!(&item.payload[..], b"value1");
        assert_eq!(item.content_type, "text/plain");
        assert_eq!(item.access_count, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_updates_access_metadata() {
        let store = LruStore::new(1024, 10, NO_TTL);
        store.set("k", blob("k", 4));

        store.get("k");
        store.get("k");
        let item = store.get("k").unwrap();

        assert_eq!(item.access_count, 3);
    }

    #[test]
    fn test_set_uses_store_key() {
        let store = LruStore::new(1024, 10, NO_TTL);
        store.set("real", blob("other", 4));

        assert_eq!(store.get("real").unwrap().key, "real");
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = LruStore::new(1024, 10, NO_TTL);

        assert!(store.get("nonexistent").is_none());
        assert_eq!(store.stats().miss_count, 1);
    }

    #[test]
    fn test_store_remove() {
        let store = LruStore::new(1024, 10, NO_TTL);

        store.set("key1", blob("key1", 10));
        assert!(store.remove("key1"));

        assert!(store.is_empty());
        assert_eq!(store.stats().total_bytes, 0);
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_remove_leaves_counters_alone() {
        let store = LruStore::new(1024, 10, NO_TTL);
        store.set("key1", blob("key1", 10));

        assert!(store.remove("key1"));
        assert!(!store.remove("key1"));

        let stats = store.stats();
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.miss_count, 0);
        assert_eq!(stats.eviction_count, 0);
    }

    #[test]
    fn test_replace_releases_old_bytes() {
        let store = LruStore::new(1024, 10, NO_TTL);

        store.set("k", blob("k", 100));
        store.set("k", blob("k", 30));

        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().total_bytes, 30);
        assert_eq!(store.get("k").unwrap().size_bytes(), 30);
        assert_eq!(store.stats().eviction_count, 0);
    }

    #[test]
    fn test_oversized_item_is_ignored() {
        let store = LruStore::new(100, 10, NO_TTL);
        store.set("small", blob("small", 50));

        store.set("big", blob("big", 101));

        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().total_bytes, 50);
        assert!(!store.contains("big"));
        assert_eq!(store.stats().eviction_count, 0);
    }

    #[test]
    fn test_oversized_replace_keeps_existing_value() {
        let store = LruStore::new(100, 10, NO_TTL);
        store.set("k", blob("k", 50));

        store.set("k", blob("k", 500));

        assert_eq!(store.get("k").unwrap().size_bytes(), 50);
    }

    #[test]
    fn test_item_exactly_at_capacity_fits() {
        let store = LruStore::new(100, 10, NO_TTL);
        store.set("a", blob("a", 10));

        store.set("full", blob("full", 100));

        assert_eq!(store.keys_by_recency(), vec!["full"]);
        assert_eq!(store.stats().total_bytes, 100);
        assert_eq!(store.stats().eviction_count, 1);
    }

    #[test]
    fn test_zero_max_items_caches_nothing() {
        let store = LruStore::new(100, 0, NO_TTL);
        store.set("a", blob("a", 1));
        assert!(store.is_empty());
    }

    #[test]
    fn test_count_limit_evicts_oldest() {
        let store = LruStore::new(10_000, 3, NO_TTL);

        store.set("key1", blob("key1", 1));
        store.set("key2", blob("key2", 1));
        store.set("key3", blob("key3", 1));
        store.set("key4", blob("key4", 1));

        assert_eq!(store.len(), 3);
        assert!(!store.contains("key1"));
        assert_eq!(store.keys_by_recency(), vec!["key4", "key3", "key2"]);
    }

    #[test]
    fn test_byte_limit_evicts_until_fit() {
        let store = LruStore::new(100, 10, NO_TTL);

        store.set("a", blob("a", 30));
        store.set("b", blob("b", 30));
        store.set("c", blob("c", 30));
        store.set("d", blob("d", 60));

        assert_eq!(store.keys_by_recency(), vec!["d", "c"]);
        assert_eq!(store.stats().total_bytes, 90);
        assert_eq!(store.stats().eviction_count, 2);
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let store = LruStore::new(10_000, 3, NO_TTL);

        store.set("a", blob("a", 1));
        store.set("b", blob("b", 1));
        store.set("c", blob("c", 1));

        store.get("a").unwrap();
        store.set("d", blob("d", 1));

        assert!(store.contains("a"));
        assert!(!store.contains("b"));
        assert!(store.contains("c"));
        assert!(store.contains("d"));
    }

    #[test]
    fn test_two_item_budget_scenario() {
        let store = LruStore::new(100, 2, NO_TTL);

        store.set("a", blob("a", 40));
        store.set("b", blob("b", 40));
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().total_bytes, 80);

        store.set("c", blob("c", 40));

        let stats = store.stats();
        assert_eq!(store.keys_by_recency(), vec!["c", "b"]);
        assert_eq!(stats.total_bytes, 80);
        assert_eq!(stats.eviction_count, 1);
    }

    #[test]
    fn test_ttl_expiration_on_get() {
        let store = LruStore::new(1024, 10, Duration::from_millis(100));

        store.set("k", blob("k", 8));
        assert!(store.get("k").is_some());

        sleep(Duration::from_millis(150));

        assert!(store.get("k").is_none());
        assert_eq!(store.len(), 0);

        let stats = store.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.expired_count, 1);
        assert_eq!(stats.eviction_count, 0);
        assert_eq!(stats.total_bytes, 0);
    }

    #[test]
    fn test_contains_ignores_expired_without_side_effects() {
        let store = LruStore::new(1024, 10, Duration::from_millis(50));
        store.set("k", blob("k", 8));
        assert!(store.contains("k"));

        sleep(Duration::from_millis(80));

        assert!(!store.contains("k"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().miss_count, 0);
    }

    #[test]
    fn test_contains_does_not_touch_recency() {
        let store = LruStore::new(1024, 2, NO_TTL);
        store.set("a", blob("a", 1));
        store.set("b", blob("b", 1));

        assert!(store.contains("a"));
        store.set("c", blob("c", 1));

        assert!(!store.contains("a"));
        assert_eq!(store.stats().hit_count, 0);
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let store = LruStore::new(1024, 10, Duration::from_millis(100));

        store.set("old1", blob("old1", 10));
        store.set("old2", blob("old2", 10));
        sleep(Duration::from_millis(150));
        store.set("fresh", blob("fresh", 10));

        assert_eq!(store.cleanup(), 2);
        assert_eq!(store.keys_by_recency(), vec!["fresh"]);
        assert_eq!(store.stats().total_bytes, 10);
        assert_eq!(store.stats().expired_count, 2);
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_cleanup_without_ttl_is_noop() {
        let store = LruStore::new(1024, 10, NO_TTL);
        store.set("k", blob("k", 1));

        assert_eq!(store.cleanup(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_stats() {
        let store = LruStore::new(1024, 10, NO_TTL);

        store.set("key1", blob("key1", 12));
        store.get("key1");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.item_count, store.len());
        assert_eq!(stats.total_bytes, 12);
    }

    #[test]
    fn test_concurrent_access_keeps_invariants() {
        let store = Arc::new(LruStore::new(2_000, 16, Duration::from_millis(5)));
        let mut handles = Vec::new();

        for t in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("k{}", (i * 7 + t) % 40);
                    match i % 5 {
                        0 | 1 => store.set(&key, blob(&key, (i % 150) + 1)),
                        2 | 3 => {
                            store.get(&key);
                        }
                        _ => {
                            if t == 0 {
                                store.cleanup();
                            } else {
                                store.remove(&key);
                            }
                        }
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = store.stats();
        assert!(stats.total_bytes <= 2_000);
        assert!(stats.item_count <= 16);
        assert_eq!(stats.hit_count + stats.miss_count, 8 * 200);
        store.check_consistency().unwrap();
    }
}
