//! Logger module
//!
//! Provides logging utilities for the mirror server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Mirror refresh progress and failures
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse::<Level>().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write(level: Level, message: &str) {
    if let Some(w) = writer::get() {
        w.write(level, message);
    } else if level <= Level::Warn {
        eprintln!("{}", writer::format_line(level, message));
    } else if level <= Level::Info {
        println!("{}", writer::format_line(level, message));
    }
}

pub fn log_info(message: &str) {
    write(Level::Info, message);
}

pub fn log_debug(message: &str) {
    write(Level::Debug, message);
}

pub fn log_warning(message: &str) {
    write(Level::Warn, message);
}

pub fn log_error(message: &str) {
    write(Level::Error, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info("======================================");
    log_info("dotmirror started");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    log_info(&format!(
        "Mirroring {}/{}@{} into {:?} storage",
        config.mirror.user, config.mirror.repo, config.mirror.branch, config.storage.backend
    ));
    if config.mirror.interval_secs == 0 {
        log_info("Scheduled refresh disabled");
    } else {
        log_info(&format!(
            "Refresh interval: {}s",
            config.mirror.interval_secs
        ));
    }
    if config.auth.secret.is_empty() {
        log_warning("auth.secret is empty: all PUT and DELETE requests will be rejected");
    }
    log_info("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    if let Some(w) = writer::get() {
        w.write_access(&line);
    } else {
        println!("{line}");
    }
}

pub fn log_storage_error(method: &str, key: &str, err: &impl std::fmt::Display) {
    log_error(&format!("[Storage] {method} '{key}' failed: {err}"));
}

pub fn log_refresh_started(url: &str) {
    log_info(&format!("[Mirror] Fetching {url}"));
}

pub fn log_archive_entry(name: &str, size: usize, mime_type: &str) {
    log_info(&format!(
        "[Mirror] Processing file: {name}, size: {size}, MIME type: {mime_type}"
    ));
}

pub fn log_blob_saved(key: &str) {
    log_info(&format!("[Mirror] Saved {key}"));
}

pub fn log_refresh_complete(written: usize, elapsed: std::time::Duration) {
    log_info(&format!(
        "[Mirror] Refresh complete: {written} files written in {}ms",
        elapsed.as_millis()
    ));
}

pub fn log_refresh_failed(err: &impl std::fmt::Display) {
    log_error(&format!("[Mirror] Refresh failed: {err}"));
}

pub fn log_shutdown() {
    log_info("Shutdown requested, no longer accepting connections");
}
