//! Service Module
//!
//! Cache-aside orchestration: fetch-on-miss, request statistics and warm-up.

mod cache_aside;
mod stats;

pub use cache_aside::{BlobResponse, CacheAside, WarmHandle, DEFAULT_FETCH_TIMEOUT, DEFAULT_WARM_CONCURRENCY};
pub use stats::ServiceStats;
