// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger reconciliation after daemon restart.
//!
//! An attempt persisted as RUNNING has no live worker once the daemon that
//! ran it is gone. Each one is failed with a retryable system reason so its
//! job goes INCOMPLETE and the coordination process can start a new attempt.

use ferry_core::{AttemptFailureSummary, Clock, FailureReason};
use ferry_storage::{JobLedger, LedgerError};
use tracing::{info, warn};

const INTERRUPTED_MESSAGE: &str = "attempt interrupted by daemon restart";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub failed_attempts: usize,
    /// Attempts left running because failing them would violate job state
    pub skipped_attempts: usize,
}

pub fn reconcile_attempts<C: Clock>(ledger: &JobLedger<C>) -> Result<ReconcileReport, LedgerError> {
    let running = ledger.running_attempts();
    if !running.is_empty() {
        info!(count = running.len(), "reconciling interrupted attempts");
    }

    let mut report = ReconcileReport::default();
    for (job_id, attempt_number) in running {
        match ledger.fail_attempt(job_id, attempt_number) {
            Ok(()) => {}
            Err(LedgerError::InvariantViolation(reason)) => {
                warn!(
                    job_id = %job_id,
                    attempt_number,
                    reason = %reason,
                    "cannot fail interrupted attempt"
                );
                report.skipped_attempts += 1;
                continue;
            }
            Err(e) => return Err(e),
        }

        let reason =
            FailureReason::system(INTERRUPTED_MESSAGE, ledger.clock().epoch_ms()).retryable(true);
        let summary = AttemptFailureSummary::single(reason);
        ledger.write_attempt_failure_summary(job_id, attempt_number, summary)?;
        info!(job_id = %job_id, attempt_number, "failed interrupted attempt");
        report.failed_attempts += 1;
    }
    Ok(report)
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
