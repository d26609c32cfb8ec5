// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use ferry_adapters::TokenHeartbeat;
use ferry_core::Clock;
use ferry_engine::JobActivities;
use ferry_storage::JobLedger;
use fs2::FileExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{reconcile_attempts, Config, DaemonState, LifecycleError};

/// Start the daemon
pub fn startup<C: Clock>(config: &Config, clock: C) -> Result<DaemonState<C>, LifecycleError> {
    match startup_inner(config, clock) {
        Ok(state) => Ok(state),
        Err(e) => {
            // The pid file belongs to the daemon holding the lock.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

fn startup_inner<C: Clock>(config: &Config, clock: C) -> Result<DaemonState<C>, LifecycleError> {
    // 1. Create state directory (needed for the lock)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents two daemons sharing a ledger.
    // Don't truncate before holding the lock or we wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Create directories
    std::fs::create_dir_all(&config.ledger_dir)?;
    std::fs::create_dir_all(&config.workspace_root)?;

    // 4. Load snapshot and replay WAL
    let ledger = Arc::new(JobLedger::open(&config.ledger_dir, clock)?);

    // 5. Attempts that were running when the previous daemon died can't finish
    let reconciled = reconcile_attempts(&ledger)?;

    // 6. Attempt heartbeats observe daemon shutdown through this token
    let shutdown_token = CancellationToken::new();
    let heartbeat = TokenHeartbeat::from_token(shutdown_token.child_token());
    let activities = JobActivities::new(Arc::clone(&ledger), heartbeat, config.activities_config());

    let state = ledger.state();
    info!(
        jobs = state.jobs.len(),
        interrupted_attempts = reconciled.failed_attempts,
        state_dir = %config.state_dir.display(),
        "daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        ledger,
        activities,
        shutdown_token,
        start_time: Instant::now(),
        reconciled,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
