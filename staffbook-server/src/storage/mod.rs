//! Object storage for avatar blobs
//!
//! [`ObjectStorage`] is the seam between the avatar manager and the blob
//! store. [`S3Storage`] talks to any S3-compatible endpoint;
//! [`MemoryStorage`] keeps objects in a map for tests and local runs.

pub mod keys;
mod memory;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use memory::MemoryStorage;
pub use s3::{S3Settings, S3Storage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Object read back from storage
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// `None` when the key does not exist
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StorageError>;

    /// Backend reachable and `bucket` accessible
    async fn health_check(&self, bucket: &str) -> bool;
}
