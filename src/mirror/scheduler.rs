//! Refresh scheduler
//!
//! Fires a refresh cycle every `mirror.interval_secs` and whenever the
//! refresh signal is notified. Each cycle runs in its own task, so a slow
//! cycle does not delay the next tick and cycles may overlap.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::job;
use crate::config::AppState;
use crate::logger;

/// Run until shutdown is requested
pub async fn run_scheduler(state: Arc<AppState>) {
    let mirror = &state.config.mirror;
    let mut ticker = if mirror.interval_secs == 0 {
        None
    } else {
        let mut ticker = interval(Duration::from_secs(mirror.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !mirror.run_on_start {
            // The first tick of an interval completes immediately
            ticker.tick().await;
        }
        Some(ticker)
    };

    if ticker.is_none() && mirror.run_on_start {
        spawn_cycle(&state, "startup");
    }

    let mut shutdown = state.shutdown.subscribe();
    if *shutdown.borrow() {
        return;
    }
    loop {
        tokio::select! {
            () = next_tick(&mut ticker) => spawn_cycle(&state, "schedule"),
            () = state.refresh_signal.notified() => spawn_cycle(&state, "manual trigger"),
            _ = shutdown.changed() => break,
        }
    }
    logger::log_debug("[Mirror] Scheduler stopped");
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn spawn_cycle(state: &Arc<AppState>, reason: &str) {
    logger::log_info(&format!("[Mirror] Refresh triggered by {reason}"));
    let state = Arc::clone(state);
    tokio::spawn(async move {
        // Failures are logged by the job; the next cycle rewrites everything
        let _ = job::refresh(&state).await;
    });
}
