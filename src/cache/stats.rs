//! Cache Statistics Module
//!
//! Point-in-time snapshot of store occupancy and hit/miss/eviction counters.

use serde::Serialize;

// == Store Stats ==
/// Snapshot of a store's occupancy and counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Current number of live items
    pub item_count: usize,
    /// Sum of live items' payload sizes
    pub total_bytes: u64,
    /// Reads that returned an item
    pub hit_count: u64,
    /// Reads that found nothing or an expired item
    pub miss_count: u64,
    /// Items removed to satisfy a capacity limit
    pub eviction_count: u64,
    /// Items removed because their TTL elapsed
    pub expired_count: u64,
}

impl StoreStats {
    // == Constructor ==
    /// Creates a new StoreStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the store-level hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hit_count += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.eviction_count += 1;
    }

    pub(crate) fn record_expiration(&mut self) {
        self.expired_count += 1;
    }
}
