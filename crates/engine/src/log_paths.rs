// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized path builders for attempt working directories and logs.
//!
//! Directory structure under the workspace root:
//! ```text
//! <workspace_root>/
//! └── <job_id>/
//!     └── <attempt_number>/
//!         └── logs.log
//! ```

use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "logs.log";

/// Working directory of one attempt: `<root>/<job_id>/<attempt_number>`.
pub fn attempt_root(workspace_root: &Path, job_id: &str, attempt_number: u32) -> PathBuf {
    workspace_root.join(job_id).join(attempt_number.to_string())
}

/// Log file of one attempt: `<root>/<job_id>/<attempt_number>/logs.log`.
pub fn attempt_log_path(workspace_root: &Path, job_id: &str, attempt_number: u32) -> PathBuf {
    attempt_root(workspace_root, job_id, attempt_number).join(LOG_FILE_NAME)
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
