//! Fetch Module
//!
//! The upstream side of the cache: anything that can produce the bytes and
//! content type for a key on a cache miss.

mod http;
mod sniff;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

pub use http::HttpFetcher;
pub use sniff::detect_content_type;

// == Fetched Blob ==
/// Raw result of an upstream fetch.
#[derive(Debug, Clone)]
pub struct FetchedBlob {
    pub payload: Bytes,
    /// Content type reported by the source, if any
    pub content_type: Option<String>,
}

impl FetchedBlob {
    pub fn new(payload: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            payload: payload.into(),
            content_type,
        }
    }

    /// Reported content type, or one sniffed from the payload when the
    /// source sent none.
    pub fn resolved_content_type(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(ct) if !ct.is_empty() => ct.to_string(),
            _ => detect_content_type(&self.payload).to_string(),
        }
    }
}

// == Fetcher ==
/// Upstream blob source consulted on cache misses.
///
/// Cancellation is cooperative: the caller drops the returned future when a
/// deadline passes or the request is abandoned.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<FetchedBlob, FetchError>;
}
