//! In-memory blob store
//!
//! Used for tests and for ephemeral deployments (`storage.backend = "memory"`).

use async_trait::async_trait;
use hyper::body::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{describe, Blob, BlobStore, PutOptions, StorageResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Blob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Sorted list of stored keys
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Blob>> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, body: Bytes, options: PutOptions) -> StorageResult<()> {
        let metadata = describe(&body, options);
        self.objects
            .write()
            .await
            .insert(key.to_string(), Blob { body, metadata });
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
