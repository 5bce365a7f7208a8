use std::sync::Arc;

use dotmirror::config::{self, AppState};
use dotmirror::{logger, mirror, server, storage};

/// Parsed command line: `dotmirror [--refresh-once] [CONFIG]`
struct Args {
    refresh_once: bool,
    config_path: String,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut refresh_once = false;
        let mut config_path = None;

        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--refresh-once" => refresh_once = true,
                "-h" | "--help" => {
                    return Err("usage: dotmirror [--refresh-once] [CONFIG]".to_string())
                }
                flag if flag.starts_with('-') => return Err(format!("unknown flag: {flag}")),
                path if config_path.is_none() => config_path = Some(path.to_string()),
                extra => return Err(format!("unexpected argument: {extra}")),
            }
        }

        Ok(Self {
            refresh_once,
            config_path: config_path.unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string()),
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse()?;
    let cfg = config::Config::load_from(&args.config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("[CONFIG] Using {workers} worker threads"));
    } else {
        logger::log_debug("[CONFIG] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, args.refresh_once))
}

async fn async_main(
    cfg: config::Config,
    refresh_once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = storage::open(&cfg.storage)?;
    let state = Arc::new(AppState::new(cfg, store)?);

    if refresh_once {
        // Errors are logged by the refresh job; the non-zero exit is the signal
        mirror::refresh(&state).await?;
        return Ok(());
    }

    let addr = state.config.get_socket_addr()?;
    let listener = server::create_listener(addr, state.config.performance.backlog)?;
    logger::log_server_start(&addr, &state.config);

    server::start_signal_handler(Arc::clone(&state));
    let scheduler = tokio::spawn(mirror::run_scheduler(Arc::clone(&state)));

    server::run(listener, Arc::clone(&state)).await?;

    if let Err(e) = scheduler.await {
        logger::log_error(&format!("Scheduler task failed: {e}"));
    }
    Ok(())
}
