//! Filesystem blob store
//!
//! Each key maps to a single file `objects/<key>` laid out as:
//!
//! ```text
//! <header length in bytes>\n
//! <ObjectMetadata as TOML>
//! <body>
//! ```
//!
//! Body and metadata share one file, written to a temp file in the target
//! directory and persisted with a single rename, so a reader always sees one
//! writer's body together with that writer's metadata.

use async_trait::async_trait;
use hyper::body::Bytes;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;

use super::{describe, Blob, BlobStore, ObjectMetadata, PutOptions, StorageError, StorageResult};

const OBJECTS_DIR: &str = "objects";

#[derive(Debug)]
pub struct FsStore {
    objects: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let objects = root.as_ref().join(OBJECTS_DIR);
        std::fs::create_dir_all(&objects)?;
        Ok(Self { objects })
    }

    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.objects.join(key))
    }
}

/// Reject keys that would escape the store root or collapse onto a directory
fn validate_key(key: &str) -> StorageResult<()> {
    let bad_segment = key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad_segment || key.contains('\\') || key.contains('\0') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Serialize the metadata header that precedes the body
fn encode_header(key: &str, metadata: &ObjectMetadata) -> StorageResult<Vec<u8>> {
    let header = toml::to_string(metadata).map_err(|e| StorageError::Metadata {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    let mut encoded = format!("{}\n", header.len()).into_bytes();
    encoded.extend_from_slice(header.as_bytes());
    Ok(encoded)
}

/// Split a stored object file into its metadata and body
fn decode_object(key: &str, raw: Vec<u8>) -> StorageResult<Blob> {
    let corrupt = |reason: &str| StorageError::Metadata {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let newline = raw
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| corrupt("missing header length"))?;
    let header_len: usize = std::str::from_utf8(&raw[..newline])
        .ok()
        .and_then(|len| len.parse().ok())
        .ok_or_else(|| corrupt("invalid header length"))?;
    let header_end = newline
        .checked_add(1 + header_len)
        .filter(|end| *end <= raw.len())
        .ok_or_else(|| corrupt("truncated header"))?;

    let header = std::str::from_utf8(&raw[newline + 1..header_end])
        .map_err(|e| corrupt(&e.to_string()))?;
    let metadata: ObjectMetadata = toml::from_str(header).map_err(|e| corrupt(&e.to_string()))?;

    let body = Bytes::from(raw).slice(header_end..);
    Ok(Blob { body, metadata })
}

/// Write header and body through a temp file in the same directory, then rename
fn persist_object(path: &Path, header: &[u8], body: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(header)?;
    tmp.write_all(body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(e) if !is_missing(&e) => Err(e),
        _ => Ok(()),
    }
}

#[async_trait]
impl BlobStore for FsStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Blob>> {
        let object_path = self.object_path(key)?;

        match fs::metadata(&object_path).await {
            Ok(m) if m.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        match fs::read(&object_path).await {
            Ok(raw) => decode_object(key, raw).map(Some),
            // Deleted between the stat and the read
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, body: Bytes, options: PutOptions) -> StorageResult<()> {
        let object_path = self.object_path(key)?;
        let header = encode_header(key, &describe(&body, options))?;

        tokio::task::spawn_blocking(move || persist_object(&object_path, &header, &body))
            .await
            .map_err(|e| StorageError::Backend(format!("write task failed: {e}")))??;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        remove_if_present(&self.object_path(key)?).await?;
        Ok(())
    }
}
