// Configuration module entry point
// Loads application configuration and holds shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    AuthConfig, Config, HttpConfig, LoggingConfig, MirrorConfig, PerformanceConfig, ServerConfig,
    StorageBackend, StorageConfig,
};

/// Default config file (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `DOTMIRROR_MIRROR__USER`
pub const ENV_PREFIX: &str = "DOTMIRROR";

impl Config {
    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    /// Apply defaults to a prepared builder, deserialize, and validate
    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let settings = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.backlog", 128)?
            .set_default(
                "http.server_name",
                concat!("dotmirror/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("auth.header", "X-Custom-Auth-Key")?
            .set_default("auth.secret", "")?
            .set_default("mirror.user", "")?
            .set_default("mirror.repo", "")?
            .set_default("mirror.branch", "main")?
            .set_default("mirror.base_url", "https://github.com")?
            .set_default("mirror.interval_secs", 3600)?
            .set_default("mirror.run_on_start", true)?
            .set_default("mirror.fetch_timeout", 60)?
            .set_default("storage.backend", "fs")?
            .set_default("storage.root", "./data")?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse configuration from an in-memory TOML document
    pub fn from_toml(content: &str) -> Result<Self, config::ConfigError> {
        Self::build(
            config::Config::builder()
                .add_source(config::File::from_str(content, config::FileFormat::Toml)),
        )
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.mirror.user.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "mirror.user must be set".to_string(),
            ));
        }
        if self.mirror.repo.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "mirror.repo must be set".to_string(),
            ));
        }
        if self.mirror.branch.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "mirror.branch must not be empty".to_string(),
            ));
        }
        if self.mirror.fetch_timeout == 0 {
            return Err(config::ConfigError::Message(
                "mirror.fetch_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
