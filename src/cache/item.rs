//! Cache Item Module
//!
//! Defines the unit of storage: an opaque payload plus access metadata.

use bytes::Bytes;
use chrono::{DateTime, Utc};

// == Cache Item ==
/// A cached blob with its content type and access metadata.
///
/// Cloning is cheap: the payload is reference-counted.
#[derive(Debug, Clone)]
pub struct CacheItem {
    /// Key the item is stored under
    pub key: String,
    /// Opaque blob content
    pub payload: Bytes,
    /// Content type descriptor, opaque to the store
    pub content_type: String,
    /// Wall-clock time of the last successful read
    pub last_access: DateTime<Utc>,
    /// Number of successful reads
    pub access_count: u64,
}

impl CacheItem {
    // == Constructor ==
    /// Creates a fresh item that has not been read yet.
    pub fn new(key: impl Into<String>, payload: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
            content_type: content_type.into(),
            last_access: Utc::now(),
            access_count: 0,
        }
    }

    // == Size ==
    /// Size used for byte-budget accounting.
    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }

    // == Record Access ==
    /// Marks a successful read.
    pub fn record_access(&mut self) {
        self.last_access = Utc::now();
        self.access_count += 1;
    }
}
