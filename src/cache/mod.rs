//! Cache Module
//!
//! Provides bounded in-memory blob storage with TTL expiration and LRU eviction.

mod item;
mod lru;
mod moka_store;
mod stats;
mod store;
mod strategy;


// Re-export public types
pub use item::CacheItem;
pub use moka_store::MokaStore;
pub use stats::StoreStats;
pub use store::LruStore;
pub use strategy::CacheStrategy;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;
