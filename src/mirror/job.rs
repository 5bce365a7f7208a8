//! Refresh job
//!
//! One cycle downloads the branch snapshot, extracts it, and writes every
//! file to storage concurrently. Keys written by earlier cycles but missing
//! from the current archive are left in place.

use hyper::body::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use super::archive::{self, ArchiveEntry};
use crate::config::{AppState, MirrorConfig};
use crate::error::{Error, Result};
use crate::logger;
use crate::storage::{BlobStore, PutOptions, StorageError};

/// Outcome of a successful cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub written: usize,
    pub elapsed: Duration,
}

/// Run one refresh cycle with the process-wide state
pub async fn refresh(state: &AppState) -> Result<RefreshReport> {
    run_refresh(
        &state.config.mirror,
        &state.http_client,
        Arc::clone(&state.store),
    )
    .await
}

/// Run one refresh cycle; failures are logged before being returned
pub async fn run_refresh(
    mirror: &MirrorConfig,
    client: &reqwest::Client,
    store: Arc<dyn BlobStore>,
) -> Result<RefreshReport> {
    let started = Instant::now();
    let result = async {
        let url = mirror.archive_url();
        logger::log_refresh_started(&url);

        let body = fetch_archive(client, &url).await?;
        let entries = extract_blocking(body, mirror.archive_prefix()).await?;
        write_entries(store, entries).await
    }
    .await;

    match result {
        Ok(written) => {
            let elapsed = started.elapsed();
            logger::log_refresh_complete(written, elapsed);
            Ok(RefreshReport { written, elapsed })
        }
        Err(e) => {
            logger::log_refresh_failed(&e);
            Err(e)
        }
    }
}

/// Download the archive; any non-2xx status aborts the cycle
async fn fetch_archive(client: &reqwest::Client, url: &str) -> Result<Bytes> {
    let upstream_error = |reason: String| Error::UpstreamFetchFailed {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| upstream_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(upstream_error(format!("HTTP {status}")));
    }

    response
        .bytes()
        .await
        .map_err(|e| upstream_error(e.to_string()))
}

/// Decompression is CPU-bound, keep it off the async workers
async fn extract_blocking(body: Bytes, prefix: String) -> Result<Vec<ArchiveEntry>> {
    tokio::task::spawn_blocking(move || archive::extract(&body, &prefix))
        .await
        .map_err(|e| Error::ArchiveDecodeFailed(format!("extraction task failed: {e}")))?
}

/// Write all entries concurrently and wait for every write to finish
///
/// A failed write does not cancel the others. The first failure is returned
/// once all writes have completed; successful writes are kept.
pub async fn write_entries(store: Arc<dyn BlobStore>, entries: Vec<ArchiveEntry>) -> Result<usize> {
    let total = entries.len();
    let mut writes = JoinSet::new();

    for entry in entries {
        let store = Arc::clone(&store);
        writes.spawn(async move {
            let options = PutOptions::with_content_type(entry.mime_type);
            let result = store.put(&entry.name, entry.content, options).await;
            (entry.name, result)
        });
    }

    let mut written = 0;
    let mut first_error: Option<StorageError> = None;
    while let Some(joined) = writes.join_next().await {
        match joined {
            Ok((key, Ok(()))) => {
                logger::log_blob_saved(&key);
                written += 1;
            }
            Ok((key, Err(e))) => {
                logger::log_storage_error("PUT", &key, &e);
                first_error.get_or_insert(e);
            }
            Err(e) => {
                logger::log_error(&format!("[Mirror] Write task failed: {e}"));
                first_error.get_or_insert(StorageError::Backend(e.to_string()));
            }
        }
    }

    match first_error {
        None => Ok(written),
        Some(e) => {
            logger::log_error(&format!(
                "[Mirror] {} of {total} writes failed",
                total - written
            ));
            Err(Error::StorageOperationFailed(e))
        }
    }
}
