// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only logger for per-attempt activity logs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes human-readable timestamped lines to an attempt's `logs.log`.
///
/// Each `append()` call opens, writes, and closes the file. Failures are
/// traced but never propagate: logging must not fail an attempt.
#[derive(Debug, Clone)]
pub struct AttemptLogger {
    path: PathBuf,
}

impl AttemptLogger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format: `2026-01-30T08:14:09Z [ferry] message`
    pub fn append(&self, message: &str) {
        if let Err(e) = self.write_line(message) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write attempt log");
        }
    }

    fn write_line(&self, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(file, "{ts} [ferry] {message}")
    }
}

#[cfg(test)]
#[path = "attempt_logger_tests.rs"]
mod tests;
