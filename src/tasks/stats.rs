//! Stats Reporter Task
//!
//! Background task that periodically logs the aggregate cache statistics.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::service::CacheAside;

/// Spawns a background task logging a stats snapshot every `interval`.
///
/// The first report is emitted after one full interval.
pub fn spawn_stats_reporter(cache: CacheAside, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

        loop {
            ticker.tick().await;

            let stats = cache.stats();
            info!(
                total_requests = stats.total_requests,
                cache_hits = stats.cache_hits,
                cache_misses = stats.cache_misses,
                hit_rate = stats.hit_rate,
                bandwidth_saved = stats.bandwidth_saved,
                fetch_failures = stats.fetch_failures,
                items = stats.store.item_count,
                bytes = stats.store.total_bytes,
                evictions = stats.store.eviction_count,
                "Cache stats"
            );
        }
    })
}
