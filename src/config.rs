//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which cache backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// Built-in LRU store with byte and item budgets
    #[default]
    Lru,
    /// moka-backed store with a byte budget
    Moka,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(CacheBackend::Lru),
            "moka" => Ok(CacheBackend::Moka),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum total payload bytes held by the store
    pub capacity_bytes: u64,
    /// Maximum number of items held by the store
    pub max_items: usize,
    /// Item TTL in seconds, 0 disables expiration
    pub ttl_secs: u64,
    /// Backend implementation
    pub backend: CacheBackend,
    /// Expired-item sweep interval in seconds
    pub cleanup_interval: u64,
    /// Stats log interval in seconds
    pub stats_interval: u64,
    /// Upstream fetch deadline in seconds, never 0
    pub fetch_timeout_secs: u64,
    /// Concurrent fetches allowed while warming
    pub warm_concurrency: usize,
    /// Base URL of the upstream blob store
    pub blob_endpoint: String,
    /// Keys fetched into the cache at startup
    pub warm_keys: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY_BYTES` - Byte budget (default: 104857600)
    /// - `CACHE_MAX_ITEMS` - Item budget (default: 1000)
    /// - `CACHE_TTL` - TTL in seconds, 0 = never expire (default: 1800)
    /// - `CACHE_BACKEND` - `lru` or `moka` (default: lru)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `STATS_INTERVAL` - Stats log frequency in seconds (default: 60)
    /// - `FETCH_TIMEOUT` - Upstream deadline in seconds, 0 = default (default: 30)
    /// - `WARM_CONCURRENCY` - Parallel warm-up fetches (default: 10)
    /// - `BLOB_ENDPOINT` - Upstream base URL (default: http://127.0.0.1:9000)
    /// - `WARM_KEYS` - Comma-separated keys to prefetch (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            capacity_bytes: parse_var(&lookup, "CACHE_CAPACITY_BYTES").unwrap_or(defaults.capacity_bytes),
            max_items: parse_var(&lookup, "CACHE_MAX_ITEMS").unwrap_or(defaults.max_items),
            ttl_secs: parse_var(&lookup, "CACHE_TTL").unwrap_or(defaults.ttl_secs),
            backend: parse_var(&lookup, "CACHE_BACKEND").unwrap_or(defaults.backend),
            cleanup_interval: parse_var(&lookup, "CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            stats_interval: parse_var(&lookup, "STATS_INTERVAL").unwrap_or(defaults.stats_interval),
            fetch_timeout_secs: parse_var(&lookup, "FETCH_TIMEOUT")
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(defaults.fetch_timeout_secs),
            warm_concurrency: parse_var(&lookup, "WARM_CONCURRENCY").unwrap_or(defaults.warm_concurrency),
            blob_endpoint: lookup("BLOB_ENDPOINT")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.blob_endpoint),
            warm_keys: lookup("WARM_KEYS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

/// Reads and parses one variable, treating parse failures as absent.
fn parse_var<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_bytes: 100 * 1024 * 1024,
            max_items: 1000,
            ttl_secs: 30 * 60,
            backend: CacheBackend::Lru,
            cleanup_interval: 5 * 60,
            stats_interval: 60,
            fetch_timeout_secs: 30,
            warm_concurrency: 10,
            blob_endpoint: "http://127.0.0.1:9000".to_string(),
            warm_keys: Vec::new(),
        }
    }
}
