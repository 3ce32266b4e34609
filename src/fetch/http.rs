//! HTTP blob source.
//!
//! Fetches `{endpoint}/{key}` with a plain GET, mapping non-success statuses
//! and transport failures onto [`FetchError`]. Each `/`-separated part of the
//! key becomes one percent-encoded path segment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::debug;

use super::{FetchedBlob, Fetcher};
use crate::error::FetchError;

const USER_AGENT: &str = concat!("blob_cache/", env!("CARGO_PKG_VERSION"));

/// Fetches blobs from a remote HTTP object store.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    endpoint: Url,
}

impl HttpFetcher {
    /// Creates a fetcher for `endpoint` whose requests give up after `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Self::with_client(client, endpoint)
    }

    /// Creates a fetcher reusing an existing client.
    ///
    /// Fails when `endpoint` is not an absolute URL that can carry a path.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Result<Self, FetchError> {
        let endpoint = endpoint.into();
        let url = Url::parse(endpoint.trim())
            .map_err(|err| FetchError::InvalidEndpoint(format!("{}: {}", endpoint, err)))?;
        if url.cannot_be_a_base() {
            return Err(FetchError::InvalidEndpoint(endpoint));
        }
        Ok(Self { client, endpoint: url })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url_for(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(key.split('/').filter(|part| !part.is_empty()));
        }
        url
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, key: &str) -> Result<FetchedBlob, FetchError> {
        let url = self.url_for(key);
        debug!(%url, "Fetching from upstream");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let payload = response.bytes().await?;

        Ok(FetchedBlob {
            payload,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(endpoint: &str) -> HttpFetcher {
        HttpFetcher::new(endpoint, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let fetcher = fetcher("http://blobs.local/");

        assert_eq!(fetcher.endpoint().as_str(), "http://blobs.local/");
        assert_eq!(fetcher.url_for("img/a.png").as_str(), "http://blobs.local/img/a.png");
        assert_eq!(fetcher.url_for("/img/a.png").as_str(), "http://blobs.local/img/a.png");
    }

    #[test]
    fn test_url_joining_keeps_endpoint_path() {
        let with_slash = fetcher("http://blobs.local/bucket/");
        let without_slash = fetcher("http://blobs.local/bucket");

        assert_eq!(with_slash.url_for("a.png").as_str(), "http://blobs.local/bucket/a.png");
        assert_eq!(without_slash.url_for("a.png").as_str(), "http://blobs.local/bucket/a.png");
    }

    #[test]
    fn test_key_is_percent_encoded() {
        let fetcher = fetcher("http://blobs.local");

        let url = fetcher.url_for("img/a b#1?.png");

        assert_eq!(url.as_str(), "http://blobs.local/img/a%20b%231%3F.png");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let relative = HttpFetcher::new("blobs.local/images", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(relative, FetchError::InvalidEndpoint(_)));

        let opaque = HttpFetcher::new("mailto:ops@blobs.local", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(opaque, FetchError::InvalidEndpoint(_)));
        assert!(!opaque.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_retryable() {
        // Port 9 (discard) on localhost is closed in test environments.
        let fetcher = HttpFetcher::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let err = fetcher.fetch("missing.png").await.unwrap_err();

        assert!(matches!(err, FetchError::Request(_)));
        assert!(err.is_retryable());
        assert!(!err.is_not_found());
    }
}
