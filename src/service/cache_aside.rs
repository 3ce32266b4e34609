//! Cache-Aside Service
//!
//! Wraps a cache backend with fetch-on-miss against an upstream source,
//! request-level accounting and bounded cache warming.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::error::Elapsed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{CacheItem, CacheStrategy, MAX_KEY_LENGTH};
use crate::config::Config;
use crate::error::{CacheError, FetchError, Result};
use crate::fetch::{FetchedBlob, Fetcher};
use crate::service::ServiceStats;

/// Default upstream deadline per fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of concurrent warm-up fetches
pub const DEFAULT_WARM_CONCURRENCY: usize = 10;

// == Blob Response ==
/// Payload returned to the caller, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct BlobResponse {
    pub payload: Bytes,
    pub content_type: String,
    /// True when served from the store without contacting upstream
    pub from_cache: bool,
}

#[derive(Debug, Default)]
struct Counters {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    bandwidth_saved: AtomicU64,
    fetch_failures: AtomicU64,
    warm_fetches: AtomicU64,
}

// == Cache Aside ==
/// Cache-aside front for an upstream blob source.
///
/// Cloning is cheap and every clone shares the same store, fetcher and
/// counters. Concurrent misses on one key each fetch; the last insert wins.
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStrategy>,
    fetcher: Arc<dyn Fetcher>,
    counters: Arc<Counters>,
    fetch_timeout: Duration,
    warm_limit: Arc<Semaphore>,
}

impl CacheAside {
    // == Constructors ==
    /// Creates a service with the default fetch deadline and warm-up width.
    pub fn new(store: Arc<dyn CacheStrategy>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            counters: Arc::new(Counters::default()),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            warm_limit: Arc::new(Semaphore::new(DEFAULT_WARM_CONCURRENCY)),
        }
    }

    /// Creates a service using the deadline and warm-up width from `config`.
    pub fn from_config(config: &Config, store: Arc<dyn CacheStrategy>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(store, fetcher)
            .with_fetch_timeout(config.fetch_timeout())
            .with_warm_concurrency(config.warm_concurrency)
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets how many warm-up fetches may be in flight at once (at least one).
    pub fn with_warm_concurrency(mut self, width: usize) -> Self {
        self.warm_limit = Arc::new(Semaphore::new(width.max(1)));
        self
    }

    pub fn store(&self) -> &Arc<dyn CacheStrategy> {
        &self.store
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    // == Get Or Fetch ==
    /// Returns the blob for `key`, fetching and caching it on a miss.
    ///
    /// Fetch failures are returned with the key attached and nothing is
    /// inserted into the store.
    pub async fn get_or_fetch(&self, key: &str) -> Result<BlobResponse> {
        self.lookup(key, None).await
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), abandoning the upstream
    /// fetch as soon as `cancel` fires.
    pub async fn get_or_fetch_with_cancel(&self, key: &str, cancel: &CancellationToken) -> Result<BlobResponse> {
        self.lookup(key, Some(cancel)).await
    }

    async fn lookup(&self, key: &str, cancel: Option<&CancellationToken>) -> Result<BlobResponse> {
        validate_key(key)?;
        self.counters.total_requests.fetch_add(1, Ordering::Relaxed);

        if let Some(item) = self.store.get(key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, size = item.size_bytes(), "Cache hit");
            return Ok(BlobResponse {
                payload: item.payload,
                content_type: item.content_type,
                from_cache: true,
            });
        }

        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Cache miss");

        let item = self.fetch_item(key, cancel).await?;
        let response = BlobResponse {
            payload: item.payload.clone(),
            content_type: item.content_type.clone(),
            from_cache: false,
        };
        self.insert(key, item);
        Ok(response)
    }

    /// Fetches `key` under the configured deadline and wraps it as an item.
    async fn fetch_item(&self, key: &str, cancel: Option<&CancellationToken>) -> Result<CacheItem> {
        let fetch = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(key));

        let outcome = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(FetchError::Cancelled),
                    result = fetch => self.flatten_deadline(result),
                }
            }
            None => {
                let result = fetch.await;
                self.flatten_deadline(result)
            }
        };

        match outcome {
            Ok(blob) => {
                let content_type = blob.resolved_content_type();
                Ok(CacheItem::new(key, blob.payload, content_type))
            }
            Err(err) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %err, "Upstream fetch failed");
                Err(CacheError::fetch(key, err))
            }
        }
    }

    fn flatten_deadline(
        &self,
        result: std::result::Result<std::result::Result<FetchedBlob, FetchError>, Elapsed>,
    ) -> std::result::Result<FetchedBlob, FetchError> {
        match result {
            Ok(inner) => inner,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        }
    }

    fn insert(&self, key: &str, item: CacheItem) {
        let size = item.size_bytes();
        self.store.set(key, item);
        self.counters.bandwidth_saved.fetch_add(size, Ordering::Relaxed);
    }

    // == Warm Keys ==
    /// Starts background fetches for every key not already cached.
    ///
    /// At most the configured number of warm fetches run at once; this call
    /// waits for a free slot before dispatching each key and returns once
    /// all keys are dispatched, while the last fetches may still be running.
    /// Failures are logged and counted, never returned.
    pub async fn warm_keys<I, K>(&self, keys: I) -> WarmHandle
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut handle = WarmHandle::default();

        for key in keys {
            let key = key.into();
            if let Err(err) = validate_key(&key) {
                warn!(key = %key, error = %err, "Skipping warm-up of invalid key");
                handle.invalid += 1;
                continue;
            }
            if self.store.contains(&key) {
                handle.already_cached += 1;
                continue;
            }

            let Ok(permit) = Arc::clone(&self.warm_limit).acquire_owned().await else {
                break;
            };
            let service = self.clone();
            handle.tasks.push(tokio::spawn(async move {
                let _permit = permit;
                service.warm_one(&key).await;
            }));
            handle.dispatched += 1;
        }

        debug!(
            dispatched = handle.dispatched,
            already_cached = handle.already_cached,
            "Cache warm-up dispatched"
        );
        handle
    }

    async fn warm_one(&self, key: &str) {
        // Another request may have filled it while this task waited.
        if self.store.contains(key) {
            return;
        }
        if let Ok(item) = self.fetch_item(key, None).await {
            debug!(key, size = item.size_bytes(), "Warmed");
            self.insert(key, item);
            self.counters.warm_fetches.fetch_add(1, Ordering::Relaxed);
        }
    }

    // == Invalidate ==
    /// Drops `key` from the store so the next lookup refetches it.
    pub fn invalidate(&self, key: &str) -> bool {
        self.store.remove(key)
    }

    // == Cleanup ==
    /// Sweeps expired items from the store.
    pub fn cleanup(&self) -> usize {
        self.store.cleanup()
    }

    // == Stats ==
    pub fn stats(&self) -> ServiceStats {
        let total_requests = self.counters.total_requests.load(Ordering::Relaxed);
        let cache_hits = self.counters.cache_hits.load(Ordering::Relaxed);

        ServiceStats {
            total_requests,
            cache_hits,
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            hit_rate: ServiceStats::compute_hit_rate(cache_hits, total_requests),
            bandwidth_saved: self.counters.bandwidth_saved.load(Ordering::Relaxed),
            fetch_failures: self.counters.fetch_failures.load(Ordering::Relaxed),
            warm_fetches: self.counters.warm_fetches.load(Ordering::Relaxed),
            store: self.store.stats(),
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

// == Warm Handle ==
/// Outcome of dispatching a warm-up batch.
///
/// Dropping the handle detaches the in-flight fetches; they still complete.
#[derive(Debug, Default)]
pub struct WarmHandle {
    /// Keys handed to a background fetch
    pub dispatched: usize,
    /// Keys skipped because the store already held them
    pub already_cached: usize,
    /// Keys skipped because they failed validation
    pub invalid: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl WarmHandle {
    /// Waits for every dispatched fetch to finish.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "Warm-up task panicked");
            }
        }
    }
}
