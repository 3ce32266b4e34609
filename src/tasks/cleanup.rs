//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired items from the cache.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::service::CacheAside;

/// Spawns a background task that periodically removes expired items.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps. The store never schedules its own sweeps; this task is the
/// only thing driving them.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: CacheAside, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired items", removed);
            } else {
                debug!("TTL cleanup: no expired items found");
            }
        }
    })
}
