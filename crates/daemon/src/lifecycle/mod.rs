// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, maintenance, shutdown.

mod reconcile;
mod startup;
pub use reconcile::{reconcile_attempts, ReconcileReport};
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ferry_adapters::TokenHeartbeat;
use ferry_core::{Clock, SystemClock};
use ferry_engine::{ActivitiesConfig, JobActivities};
use ferry_storage::{JobLedger, LedgerError, RetentionPolicy};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/ferry)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Directory holding the ledger WAL and snapshot
    pub ledger_dir: PathBuf,
    /// Root of per-attempt working directories and logs
    pub workspace_root: PathBuf,
    pub heartbeat_interval: Duration,
    pub max_sync_retries: u32,
    pub checkpoint_interval: Duration,
    pub retention: RetentionPolicy,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let mut config = Self::for_state_dir(crate::env::state_dir()?);
        config.heartbeat_interval = crate::env::heartbeat_interval();
        config.max_sync_retries = crate::env::max_sync_retries();
        config.checkpoint_interval = crate::env::checkpoint_interval();
        if let Some(days) = crate::env::retention_days() {
            config.retention.minimum_age_days = days;
        }
        if let Some(max) = crate::env::retention_excessive_jobs() {
            config.retention.excessive_number_of_jobs = max;
        }
        if let Some(keep) = crate::env::retention_min_recent() {
            config.retention.minimum_recency = keep;
        }
        Ok(config)
    }

    /// Fixed layout under `state_dir` with default tunables.
    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            lock_path: state_dir.join("ferryd.pid"),
            log_path: state_dir.join("ferryd.log"),
            ledger_dir: state_dir.join("ledger"),
            workspace_root: state_dir.join("workspace"),
            heartbeat_interval: ferry_engine::DEFAULT_HEARTBEAT_INTERVAL,
            max_sync_retries: ferry_engine::DEFAULT_MAX_SYNC_RETRIES,
            checkpoint_interval: Duration::from_secs(60),
            retention: RetentionPolicy::default(),
            state_dir,
        }
    }

    pub fn activities_config(&self) -> ActivitiesConfig {
        ActivitiesConfig::new(&self.workspace_root)
            .heartbeat_interval(self.heartbeat_interval)
            .max_sync_retries(self.max_sync_retries)
    }
}

/// What one maintenance pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub purged: usize,
    pub checkpoint_seq: Option<u64>,
}

/// Daemon state during operation.
pub struct DaemonState<C: Clock = SystemClock> {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub ledger: Arc<JobLedger<C>>,
    /// Activities for coordination processes hosted against this daemon
    pub activities: JobActivities<C, TokenHeartbeat>,
    /// Cancelled on shutdown; every attempt's heartbeat observes it
    pub shutdown_token: CancellationToken,
    pub start_time: Instant,
    pub reconciled: ReconcileReport,
}

impl<C: Clock> DaemonState<C> {
    /// Purge old job history, then checkpoint the ledger.
    pub fn maintain(&self) -> Result<MaintenanceReport, LifecycleError> {
        let now_ms = self.ledger.clock().epoch_ms();
        let purged = self.ledger.purge_job_history(now_ms, &self.config.retention)?;
        let checkpoint_seq = self.ledger.checkpoint()?;
        Ok(MaintenanceReport { purged: purged.len(), checkpoint_seq })
    }

    /// Shutdown the daemon gracefully.
    ///
    /// Running attempts see cancellation on their next heartbeat. A final
    /// checkpoint keeps the next startup from replaying the WAL.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!(uptime_secs = self.start_time.elapsed().as_secs(), "shutting down daemon");
        self.shutdown_token.cancel();

        match self.ledger.checkpoint() {
            Ok(seq) => info!(?seq, "saved final shutdown snapshot"),
            Err(e) => warn!(error = %e, "failed to save shutdown snapshot"),
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove PID file");
            }
        }

        info!("daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
