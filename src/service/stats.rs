//! Service Statistics Module
//!
//! Aggregate view over the cache-aside counters and the backing store.

use serde::Serialize;

use crate::cache::StoreStats;

// == Service Stats ==
/// Snapshot of request-level counters plus the nested store snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceStats {
    /// Lookups served, hits and misses alike
    pub total_requests: u64,
    /// Lookups answered from the store
    pub cache_hits: u64,
    /// Lookups that went upstream
    pub cache_misses: u64,
    /// cache_hits / total_requests, 0.0 before the first request
    pub hit_rate: f64,
    /// Bytes fetched and cached, i.e. bytes later hits will not re-fetch
    pub bandwidth_saved: u64,
    /// Upstream fetches that failed, timed out or were cancelled
    pub fetch_failures: u64,
    /// Successful fetches issued by cache warming
    pub warm_fetches: u64,
    /// Store-level snapshot
    pub store: StoreStats,
}

impl ServiceStats {
    /// Divides hits by requests, guarding the empty case.
    pub fn compute_hit_rate(cache_hits: u64, total_requests: u64) -> f64 {
        if total_requests == 0 {
            0.0
        } else {
            cache_hits as f64 / total_requests as f64
        }
    }
}
