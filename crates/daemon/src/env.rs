// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: FERRY_STATE_DIR > XDG_STATE_HOME/ferry > ~/.local/state/ferry
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("FERRY_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("ferry"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/ferry"))
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn millis_var(name: &str, default: Duration) -> Duration {
    parse_var::<u64>(name).map(Duration::from_millis).unwrap_or(default)
}

/// Attempt heartbeat period (default 10s)
pub fn heartbeat_interval() -> Duration {
    millis_var("FERRY_HEARTBEAT_MS", Duration::from_secs(10))
}

pub fn max_sync_retries() -> u32 {
    parse_var("FERRY_MAX_SYNC_RETRIES").unwrap_or(3)
}

/// Period of the checkpoint + retention loop (default 60s)
pub fn checkpoint_interval() -> Duration {
    millis_var("FERRY_CHECKPOINT_MS", Duration::from_secs(60))
}

pub fn retention_days() -> Option<u64> {
    parse_var("FERRY_RETENTION_DAYS")
}

pub fn retention_excessive_jobs() -> Option<usize> {
    parse_var("FERRY_RETENTION_EXCESSIVE_JOBS")
}

pub fn retention_min_recent() -> Option<usize> {
    parse_var("FERRY_RETENTION_MIN_RECENT")
}

/// Tracing filter directive: `FERRY_LOG`, then `RUST_LOG`, then "info".
pub fn log_filter() -> String {
    ["FERRY_LOG", "RUST_LOG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
