// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::snapshot::SnapshotError;
use crate::wal::WalError;
use ferry_core::{JobId, TransitionError};
use thiserror::Error;

/// Errors from [`JobLedger`](crate::JobLedger) operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The caller broke the job/attempt contract (e.g. a second running
    /// attempt). Retrying will not help.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("attempt {attempt_number} of job {job_id} not found")]
    AttemptNotFound { job_id: JobId, attempt_number: u32 },

    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl LedgerError {
    /// Whether the failure is transient storage trouble that a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Wal(_) | LedgerError::Snapshot(_))
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, LedgerError::InvariantViolation(_))
    }
}

impl From<TransitionError> for LedgerError {
    fn from(e: TransitionError) -> Self {
        LedgerError::InvariantViolation(e.to_string())
    }
}
