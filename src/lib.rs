//! Blob Cache - A bounded in-memory cache in front of a remote blob store
//!
//! Provides a size- and count-bounded LRU store with TTL expiration, plus a
//! cache-aside service that fetches misses from an upstream source.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod service;
pub mod tasks;

pub use cache::{CacheItem, CacheStrategy, LruStore, MokaStore, StoreStats};
pub use config::{CacheBackend, Config};
pub use error::{CacheError, FetchError, Result};
pub use fetch::{FetchedBlob, Fetcher, HttpFetcher};
pub use service::{BlobResponse, CacheAside, ServiceStats, WarmHandle};
pub use tasks::{spawn_cleanup_task, spawn_stats_reporter};
