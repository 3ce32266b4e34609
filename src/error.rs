//! Error types for the blob cache
//!
//! Provides unified error handling using thiserror. Store operations never
//! fail; every error originates at the fetch boundary.

use std::time::Duration;

use thiserror::Error;

// == Fetch Error Enum ==
/// Failure reported by a [`Fetcher`](crate::fetch::Fetcher) backend.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Upstream answered with a non-success status
    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    /// Transport or body-read failure from the HTTP client
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint URL could not be used as a base for blob keys
    #[error("invalid upstream endpoint: {0}")]
    InvalidEndpoint(String),

    /// Backend-specific failure for non-HTTP sources
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// Fetch exceeded its deadline
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    /// Fetch was cancelled by the caller
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    // == Classification ==
    /// Returns true when the source reported the blob as missing.
    ///
    /// Transport layers map this to a 404-style answer; everything else is
    /// an availability problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404 | 410 })
    }

    /// Returns true when retrying the same fetch later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status } => *status == 429 || *status >= 500,
            FetchError::Request(err) => err.is_timeout() || err.is_connect() || err.is_body(),
            FetchError::Unavailable(_) | FetchError::Timeout(_) => true,
            FetchError::InvalidEndpoint(_) | FetchError::Cancelled => false,
        }
    }
}

// == Cache Error Enum ==
/// Error returned by the cache-aside service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key rejected before any lookup happened
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Upstream fetch failed on a cache miss
    #[error("Failed to fetch '{key}': {source}")]
    Fetch {
        key: String,
        #[source]
        source: FetchError,
    },
}

impl CacheError {
    /// Wraps a fetch failure with the key being fetched.
    pub fn fetch(key: impl Into<String>, source: FetchError) -> Self {
        CacheError::Fetch {
            key: key.into(),
            source,
        }
    }

    /// Returns true when the item does not exist upstream.
    pub fn is_not_found(&self) -> bool {
        match self {
            CacheError::Fetch { source, .. } => source.is_not_found(),
            CacheError::InvalidKey(_) => false,
        }
    }

    /// Returns true when the failure is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            CacheError::Fetch { source, .. } => source.is_retryable(),
            CacheError::InvalidKey(_) => false,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the blob cache.
pub type Result<T> = std::result::Result<T, CacheError>;
