//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired items at configured intervals
//! - Stats Reporter: Logs aggregate hit/miss/bandwidth counters

mod cleanup;
mod stats;

pub use cleanup::spawn_cleanup_task;
pub use stats::spawn_stats_reporter;
