// Application state module
// Shared by the request handler, the mirror scheduler and the signal handler

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

use super::types::Config;
use crate::storage::BlobStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn BlobStore>,
    /// Client used to download mirror archives
    pub http_client: reqwest::Client,
    /// Requests an out-of-schedule mirror refresh
    pub refresh_signal: Arc<Notify>,
    /// Flips to `true` once to stop the accept loop and the scheduler
    pub shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn BlobStore>) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.http.server_name.as_str())
            .timeout(Duration::from_secs(config.mirror.fetch_timeout))
            .build()?;

        Ok(Self {
            config,
            store,
            http_client,
            refresh_signal: Arc::new(Notify::new()),
            shutdown: watch::channel(false).0,
        })
    }

    /// Ask every subscriber of `shutdown` to stop
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
