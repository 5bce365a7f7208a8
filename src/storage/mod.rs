//! Blob storage module
//!
//! Defines the `BlobStore` interface shared by the request handler and the
//! mirror job, plus the adapters that implement it.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use hyper::body::Bytes;
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Errors raised by storage adapters
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid key '{0}'")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt metadata for '{key}': {reason}")]
    Metadata { key: String, reason: String },

    #[error("backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata recorded alongside every stored blob
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ObjectMetadata {
    /// Content type given at write time, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Quoted entity tag computed by the store
    pub etag: String,
    pub size: u64,
}

/// A stored object
#[derive(Debug, Clone)]
pub struct Blob {
    pub body: Bytes,
    pub metadata: ObjectMetadata,
}

/// Options for a single write
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub content_type: Option<String>,
}

impl PutOptions {
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
        }
    }
}

/// Key-value blob store with per-key atomic replace semantics
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob at `key`, `None` if absent
    async fn get(&self, key: &str) -> StorageResult<Option<Blob>>;

    /// Write `body` at `key`, replacing any previous blob
    async fn put(&self, key: &str, body: Bytes, options: PutOptions) -> StorageResult<()>;

    /// Remove the blob at `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Build the store selected by configuration
pub fn open(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Fs => Ok(Arc::new(FsStore::open(&config.root)?)),
    }
}

/// Build metadata for a freshly written body
pub(crate) fn describe(body: &[u8], options: PutOptions) -> ObjectMetadata {
    ObjectMetadata {
        content_type: options.content_type,
        etag: crate::http::etag::generate_etag(body),
        size: body.len() as u64,
    }
}
