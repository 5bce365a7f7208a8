// Signal handling module
//
// Supported signals:
// - SIGHUP:  Run a mirror refresh now
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

/// Start signal handlers (Unix only)
///
/// | Signal  | Action                    |
/// |---------|---------------------------|
/// | SIGHUP  | Trigger mirror refresh    |
/// | SIGTERM | Graceful stop             |
/// | SIGINT  | Graceful stop             |
#[cfg(unix)]
pub fn start_signal_handler(state: Arc<AppState>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let registered = (|| {
            Ok::<_, std::io::Error>((
                signal(SignalKind::hangup())?,
                signal(SignalKind::terminate())?,
                signal(SignalKind::interrupt())?,
            ))
        })();
        let (mut sighup, mut sigterm, mut sigint) = match registered {
            Ok(signals) => signals,
            Err(e) => {
                logger::log_error(&format!("Failed to register signal handlers: {e}"));
                return;
            }
        };

        logger::log_info(&format!(
            "[Signal] Handlers registered (pid {}): HUP=refresh, TERM/INT=shutdown",
            std::process::id()
        ));

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    logger::log_info("[Signal] SIGHUP received, triggering mirror refresh");
                    state.refresh_signal.notify_one();
                }

                _ = sigterm.recv() => {
                    logger::log_info("[Signal] SIGTERM received, shutting down");
                    state.request_shutdown();
                    break;
                }

                _ = sigint.recv() => {
                    logger::log_info("[Signal] SIGINT received, shutting down");
                    state.request_shutdown();
                    break;
                }
            }
        }
    });
}

/// Non-unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(state: Arc<AppState>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("[Signal] Ctrl+C received, shutting down");
            state.request_shutdown();
        }
    });
}
