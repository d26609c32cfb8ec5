// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ferryd`: hosts the job ledger and runs periodic maintenance.

use ferry_core::SystemClock;
use ferry_daemon::{env, startup, Config, LifecycleError};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;
    let _log_guard = init_tracing(&config);

    let mut daemon = match startup(&config, SystemClock) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "daemon startup failed");
            return Err(e);
        }
    };
    info!(pid = std::process::id(), version = env!("CARGO_PKG_VERSION"), "ferryd ready");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(config.checkpoint_interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => match daemon.maintain() {
                Ok(report) => info!(
                    purged = report.purged,
                    checkpoint_seq = ?report.checkpoint_seq,
                    "maintenance complete"
                ),
                Err(e) => warn!(error = %e, "maintenance failed"),
            },
        }
    }

    daemon.shutdown()
}

/// Log to `ferryd.log` in the state directory, filtered by `FERRY_LOG`.
fn init_tracing(config: &Config) -> WorkerGuard {
    let file_name = config
        .log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ferryd.log".into());
    let appender = tracing_appender::rolling::never(&config.state_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
    guard
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
