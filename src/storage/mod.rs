//! Object Storage
//!
//! File bytes for documents. Keys are slash-separated paths inside one bucket.

mod fs_store;
mod rest_store;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::domain::DomainResult;

pub use fs_store::FsObjectStore;
pub use rest_store::{RestObjectStore, DEFAULT_SIGNED_URL_TTL};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`; returns the public URL of the object
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> DomainResult<String>;

    async fn delete(&self, key: &str) -> DomainResult<()>;

    fn public_url(&self, key: &str) -> String;

    /// Time-limited URL where the store supports it, else the public URL
    async fn signed_url(&self, key: &str) -> DomainResult<String> {
        Ok(self.public_url(key))
    }
}

// Path characters that must be escaped inside one key segment
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}');

/// Percent-encode each segment of a key, keeping the slashes
pub(crate) fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
