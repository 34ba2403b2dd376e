use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{ObjectStorage, StorageError, StoredObject};

/// In-process object store. `set_available(false)` simulates an outage.
#[derive(Clone)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<(String, String), StoredObject>>>,
    available: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Backend("connection refused".into()))
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.objects.write().await.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                content_type: Some(content_type.to_string()),
            },
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StorageError> {
        self.ensure_available()?;
        Ok(self
            .objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn health_check(&self, _bucket: &str) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
