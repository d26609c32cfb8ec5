// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt event handlers.

use ferry_core::{Attempt, AttemptStatus, JobId, JobStatus, LedgerEvent};

use super::LedgerState;

pub(crate) fn apply(state: &mut LedgerState, event: &LedgerEvent) {
    match event {
        LedgerEvent::AttemptCreated { job_id, attempt_number, log_path, at_ms } => {
            let Some(job) = state.jobs.get_mut(job_id) else { return };
            if job.attempt(*attempt_number).is_some() {
                return;
            }
            job.attempts.push(Attempt::new(*job_id, *attempt_number, log_path.clone(), *at_ms));
            if !job.is_terminal() {
                job.status = JobStatus::Running;
            }
            job.started_at_ms.get_or_insert(*at_ms);
            job.updated_at_ms = *at_ms;
        }

        LedgerEvent::AttemptFailed { job_id, attempt_number, at_ms } => {
            let (job_id, n) = (*job_id, *attempt_number);
            finish(state, job_id, n, AttemptStatus::Failed, JobStatus::Incomplete, *at_ms);
        }

        LedgerEvent::AttemptSucceeded { job_id, attempt_number, at_ms } => {
            let (job_id, n) = (*job_id, *attempt_number);
            finish(state, job_id, n, AttemptStatus::Succeeded, JobStatus::Succeeded, *at_ms);
        }

        LedgerEvent::AttemptOutputWritten { job_id, attempt_number, output, at_ms } => {
            if let Some(attempt) = attempt_mut(state, *job_id, *attempt_number) {
                attempt.output = Some(output.clone());
                attempt.updated_at_ms = *at_ms;
            }
        }

        LedgerEvent::AttemptStatsWritten { job_id, attempt_number, stats, streams, at_ms } => {
            if let Some(attempt) = attempt_mut(state, *job_id, *attempt_number) {
                attempt.upsert_stats(stats.clone(), streams);
                attempt.updated_at_ms = *at_ms;
            }
        }

        LedgerEvent::AttemptFailureSummaryWritten { job_id, attempt_number, summary, at_ms } => {
            if let Some(attempt) = attempt_mut(state, *job_id, *attempt_number) {
                attempt.failure_summary = Some(summary.clone());
                attempt.updated_at_ms = *at_ms;
            }
        }

        LedgerEvent::AttemptWorkflowInfoSet {
            job_id,
            attempt_number,
            workflow_id,
            processing_queue,
            at_ms,
        } => {
            if let Some(attempt) = attempt_mut(state, *job_id, *attempt_number) {
                attempt.workflow_id = Some(workflow_id.clone());
                attempt.processing_queue = processing_queue.clone();
                attempt.updated_at_ms = *at_ms;
            }
        }

        _ => {}
    }
}

/// Terminate an attempt and move a non-terminal job to `job_status`.
///
/// A running attempt takes `attempt_status`. Success on a non-terminal job
/// also overrides an earlier FAILED mark, so a SUCCEEDED job always has a
/// succeeded attempt. Terminal jobs keep their attempts as they are.
fn finish(
    state: &mut LedgerState,
    job_id: JobId,
    attempt_number: u32,
    attempt_status: AttemptStatus,
    job_status: JobStatus,
    at_ms: u64,
) {
    let Some(job) = state.jobs.get_mut(&job_id) else { return };
    let job_was_terminal = job.is_terminal();
    if !job_was_terminal && job.status != job_status {
        job.status = job_status;
        job.updated_at_ms = at_ms;
    }
    if let Some(attempt) = job.attempt_mut(attempt_number) {
        let success_override = attempt_status == AttemptStatus::Succeeded
            && !job_was_terminal
            && attempt.status != AttemptStatus::Succeeded;
        if attempt.is_running() || success_override {
            attempt.status = attempt_status;
            attempt.updated_at_ms = at_ms;
        }
        attempt.ended_at_ms.get_or_insert(at_ms);
    }
}

fn attempt_mut(
    state: &mut LedgerState,
    job_id: JobId,
    attempt_number: u32,
) -> Option<&mut Attempt> {
    state.jobs.get_mut(&job_id).and_then(|job| job.attempt_mut(attempt_number))
}
