// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub mirror: MirrorConfig,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level written: error, warn, info, debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    pub backlog: i32,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    /// Upper bound on PUT bodies, in bytes
    pub max_body_size: u64,
}

/// Shared-secret authorization for mutating requests
#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    pub header: String,
    pub secret: String,
}

// Keep the secret out of debug output
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("header", &self.header)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Source archive to mirror into storage
#[derive(Debug, Deserialize, Clone)]
pub struct MirrorConfig {
    pub user: String,
    pub repo: String,
    pub branch: String,
    /// Archive and clone host, e.g. `https://github.com`
    pub base_url: String,
    /// Seconds between refresh cycles; 0 disables the scheduler
    pub interval_secs: u64,
    pub run_on_start: bool,
    /// Seconds allowed for the archive download
    pub fetch_timeout: u64,
}

impl MirrorConfig {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// URL of the branch snapshot archive
    pub fn archive_url(&self) -> String {
        format!(
            "{}/{}/{}/archive/refs/heads/{}.zip",
            self.base(),
            self.user,
            self.repo,
            self.branch
        )
    }

    /// Top-level directory name inside the archive
    pub fn archive_prefix(&self) -> String {
        format!("{}-{}", self.repo, self.branch)
    }

    /// Git clone URL used by the installer script
    pub fn clone_url(&self) -> String {
        format!("{}/{}/{}.git", self.base(), self.user, self.repo)
    }
}

/// Storage backend selection
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Fs,
}

/// Storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the `fs` backend
    pub root: String,
}
