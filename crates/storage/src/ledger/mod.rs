// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job ledger: authoritative job/attempt state machine with single-flight
//! admission per scope.
//!
//! Every mutation takes the ledger lock, checks its preconditions against the
//! materialized state, appends one event to the WAL and applies it. The check
//! and the write are one unit, so concurrent callers cannot both pass a
//! condition that only one of them should.

mod queries;

pub use queries::AttemptStats;

use crate::error::LedgerError;
use crate::retention::RetentionPolicy;
use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::LedgerState;
use crate::wal::Wal;
use ferry_core::{
    Attempt, AttemptFailureSummary, Clock, ConfigType, Job, JobId, JobStatus, LedgerEvent,
    StreamSyncStats, SyncStats, SystemClock,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

const WAL_FILE: &str = "ledger.wal";
const SNAPSHOT_FILE: &str = "snapshot.zst";

pub struct JobLedger<C: Clock = SystemClock> {
    inner: Mutex<Inner>,
    clock: C,
}

struct Inner {
    state: LedgerState,
    /// `None` for in-memory ledgers
    store: Option<Store>,
}

struct Store {
    wal: Wal,
    snapshot_path: PathBuf,
}

impl<C: Clock> JobLedger<C> {
    /// Open the durable ledger in `dir`: load the snapshot, then replay the WAL.
    pub fn open(dir: &Path, clock: C) -> Result<Self, LedgerError> {
        let snapshot_path = dir.join(SNAPSHOT_FILE);
        let wal_path = dir.join(WAL_FILE);
        let (mut state, seq) = match Snapshot::load(&snapshot_path) {
            Ok(Some(snapshot)) => (snapshot.state, snapshot.seq),
            Ok(None) => (LedgerState::default(), 0),
            Err(e @ SnapshotError::Version(_)) => return Err(e.into()),
            Err(e) => {
                discard_unreadable_snapshot(&snapshot_path, &wal_path, e)?;
                (LedgerState::default(), 0)
            }
        };

        let wal = Wal::open(&wal_path, seq)?;
        let entries = wal.entries_after(seq)?;
        for entry in &entries {
            state.apply_event(&entry.event);
        }

        tracing::info!(
            dir = %dir.display(),
            snapshot_seq = seq,
            replayed = entries.len(),
            jobs = state.jobs.len(),
            "job ledger opened"
        );

        let store = Some(Store { wal, snapshot_path });
        Ok(Self { inner: Mutex::new(Inner { state, store }), clock })
    }

    /// A ledger with no backing files.
    pub fn in_memory(clock: C) -> Self {
        Self { inner: Mutex::new(Inner { state: LedgerState::default(), store: None }), clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Insert a PENDING job.
    ///
    /// Replication-class jobs are admitted only when the scope has no other
    /// non-terminal replication job; otherwise nothing is written and `None`
    /// is returned.
    pub fn enqueue(
        &self,
        scope: &str,
        config_type: ConfigType,
        config: serde_json::Value,
    ) -> Result<Option<JobId>, LedgerError> {
        let mut inner = self.inner.lock();
        if config_type.is_replication() {
            if let Some(active) = inner.state.active_replication_job(scope) {
                tracing::info!(
                    scope,
                    %config_type,
                    active_job_id = %active.id,
                    active_status = %active.status,
                    "replication job already active, not enqueueing"
                );
                return Ok(None);
            }
        }

        let id = inner.state.next_job_id();
        inner.commit(LedgerEvent::JobEnqueued {
            id,
            scope: scope.to_string(),
            config_type,
            config,
            at_ms: self.clock.epoch_ms(),
        })?;
        tracing::info!(job_id = %id, scope, %config_type, "job enqueued");
        Ok(Some(id))
    }

    /// Start a new RUNNING attempt and move the job to RUNNING.
    pub fn create_attempt(&self, job_id: JobId, log_path: &Path) -> Result<u32, LedgerError> {
        let mut inner = self.inner.lock();
        let job = inner.job(job_id)?;
        if job.is_terminal() {
            return Err(LedgerError::InvariantViolation(format!(
                "cannot create an attempt for job {} in terminal status {} (scope {})",
                job.id, job.status, job.scope
            )));
        }
        if let Some(running) = job.running_attempt() {
            return Err(LedgerError::InvariantViolation(format!(
                "cannot create an attempt for job {} with running attempt {} (scope {})",
                job.id, running.attempt_number, job.scope
            )));
        }
        job.status.validate_transition(JobStatus::Running)?;

        let attempt_number = job.attempts_count();
        inner.commit(LedgerEvent::AttemptCreated {
            job_id,
            attempt_number,
            log_path: log_path.to_path_buf(),
            at_ms: self.clock.epoch_ms(),
        })?;
        tracing::info!(job_id = %job_id, attempt_number, "attempt created");
        Ok(attempt_number)
    }

    /// Mark the attempt FAILED and the job INCOMPLETE, unless the job is terminal.
    pub fn fail_attempt(&self, job_id: JobId, attempt_number: u32) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        let job = inner.job(job_id)?;
        inner.attempt(job_id, attempt_number)?;
        if !job.is_terminal() {
            job.status.validate_transition(JobStatus::Incomplete)?;
        }
        inner.commit(LedgerEvent::AttemptFailed {
            job_id,
            attempt_number,
            at_ms: self.clock.epoch_ms(),
        })?;
        tracing::info!(job_id = %job_id, attempt_number, "attempt failed");
        Ok(())
    }

    /// Mark the attempt SUCCEEDED and the job SUCCEEDED.
    ///
    /// Success overrides any non-terminal job status, including INCOMPLETE
    /// left behind by a failure of this same attempt. It is an invariant
    /// violation while a different attempt of the job is running.
    pub fn succeed_attempt(&self, job_id: JobId, attempt_number: u32) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        let job = inner.job(job_id)?;
        inner.attempt(job_id, attempt_number)?;
        if let Some(running) = job.running_attempt() {
            if running.attempt_number != attempt_number && !job.is_terminal() {
                return Err(LedgerError::InvariantViolation(format!(
                    "cannot succeed attempt {attempt_number} of job {job_id} \
                     while attempt {} is running",
                    running.attempt_number
                )));
            }
        }
        inner.commit(LedgerEvent::AttemptSucceeded {
            job_id,
            attempt_number,
            at_ms: self.clock.epoch_ms(),
        })?;
        tracing::info!(job_id = %job_id, attempt_number, "attempt succeeded");
        Ok(())
    }

    pub fn cancel_job(&self, job_id: JobId) -> Result<(), LedgerError> {
        self.force_status(job_id, JobStatus::Cancelled)
    }

    /// Move a non-terminal job back to PENDING so it can be re-driven.
    pub fn reset_job(&self, job_id: JobId) -> Result<(), LedgerError> {
        self.force_status(job_id, JobStatus::Pending)
    }

    pub fn fail_job(&self, job_id: JobId) -> Result<(), LedgerError> {
        self.force_status(job_id, JobStatus::Failed)
    }

    fn force_status(&self, job_id: JobId, status: JobStatus) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        let job = inner.job(job_id)?;
        if job.is_terminal() {
            tracing::debug!(
                job_id = %job_id,
                current = %job.status,
                requested = %status,
                "job already terminal"
            );
            return Ok(());
        }
        job.status.validate_transition(status)?;
        let at_ms = self.clock.epoch_ms();
        inner.commit(LedgerEvent::JobStatusChanged { id: job_id, status, at_ms })?;
        tracing::info!(job_id = %job_id, %status, "job status changed");
        Ok(())
    }

    pub fn write_attempt_output(
        &self,
        job_id: JobId,
        attempt_number: u32,
        output: serde_json::Value,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        inner.attempt(job_id, attempt_number)?;
        inner.commit(LedgerEvent::AttemptOutputWritten {
            job_id,
            attempt_number,
            output,
            at_ms: self.clock.epoch_ms(),
        })
    }

    /// Upsert aggregate stats and per-stream stats for an attempt.
    pub fn write_attempt_stats(
        &self,
        job_id: JobId,
        attempt_number: u32,
        stats: SyncStats,
        streams: Vec<StreamSyncStats>,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        inner.attempt(job_id, attempt_number)?;
        inner.commit(LedgerEvent::AttemptStatsWritten {
            job_id,
            attempt_number,
            stats,
            streams,
            at_ms: self.clock.epoch_ms(),
        })
    }

    pub fn write_attempt_failure_summary(
        &self,
        job_id: JobId,
        attempt_number: u32,
        summary: AttemptFailureSummary,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        inner.attempt(job_id, attempt_number)?;
        inner.commit(LedgerEvent::AttemptFailureSummaryWritten {
            job_id,
            attempt_number,
            summary,
            at_ms: self.clock.epoch_ms(),
        })
    }

    /// Record the engine correlation id used to route cancellation to this attempt.
    pub fn set_attempt_workflow_info(
        &self,
        job_id: JobId,
        attempt_number: u32,
        workflow_id: &str,
        processing_queue: Option<&str>,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        inner.attempt(job_id, attempt_number)?;
        inner.commit(LedgerEvent::AttemptWorkflowInfoSet {
            job_id,
            attempt_number,
            workflow_id: workflow_id.to_string(),
            processing_queue: processing_queue.map(str::to_string),
            at_ms: self.clock.epoch_ms(),
        })
    }

    /// Oldest PENDING job whose scope has no RUNNING or INCOMPLETE job.
    pub fn get_next_job(&self) -> Option<Job> {
        let inner = self.inner.lock();
        let state = &inner.state;
        state
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending && !state.scope_is_busy(&job.scope))
            .min_by_key(|job| (job.created_at_ms, job.id))
            .cloned()
    }

    /// Delete job history according to `policy`, returning the purged ids.
    pub fn purge_job_history(
        &self,
        now_ms: u64,
        policy: &RetentionPolicy,
    ) -> Result<Vec<JobId>, LedgerError> {
        let mut inner = self.inner.lock();
        let ids = policy.select(&inner.state, now_ms);
        if ids.is_empty() {
            return Ok(ids);
        }
        inner.commit(LedgerEvent::JobsPurged { ids: ids.clone() })?;
        tracing::info!(count = ids.len(), "purged job history");
        Ok(ids)
    }

    /// Write a snapshot of the current state and drop the WAL entries it covers.
    ///
    /// Returns the snapshot's WAL sequence, or `None` for in-memory ledgers.
    pub fn checkpoint(&self) -> Result<Option<u64>, LedgerError> {
        let mut inner = self.inner.lock();
        let Inner { state, store } = &mut *inner;
        let Some(store) = store.as_mut() else { return Ok(None) };

        let seq = store.wal.write_seq();
        Snapshot::new(seq, state.clone()).save(&store.snapshot_path)?;
        store.wal.truncate_before(seq + 1)?;
        tracing::debug!(seq, "ledger checkpoint written");
        Ok(Some(seq))
    }
}

/// Set an undecodable snapshot aside when the WAL still starts at its first
/// entry. Otherwise checkpoints have truncated history the snapshot alone
/// held, and opening empty would reissue job ids.
fn discard_unreadable_snapshot(
    snapshot_path: &Path,
    wal_path: &Path,
    error: SnapshotError,
) -> Result<(), LedgerError> {
    let entries = Wal::open(wal_path, 0)?.entries_after(0)?;
    if entries.first().map(|e| e.seq) != Some(1) {
        tracing::error!(
            error = %error,
            path = %snapshot_path.display(),
            "unreadable snapshot and the WAL no longer holds full history"
        );
        return Err(error.into());
    }
    let bak = Snapshot::set_aside(snapshot_path)?;
    tracing::warn!(
        error = %error,
        bak = %bak.display(),
        "unreadable snapshot set aside, replaying the full WAL"
    );
    Ok(())
}

impl Inner {
    fn commit(&mut self, event: LedgerEvent) -> Result<(), LedgerError> {
        if let Some(store) = self.store.as_mut() {
            store.wal.append(&event)?;
            store.wal.flush()?;
        }
        self.state.apply_event(&event);
        tracing::trace!(event = %event.log_summary(), "ledger commit");
        Ok(())
    }

    fn job(&self, job_id: JobId) -> Result<&Job, LedgerError> {
        self.state.get_job(job_id).ok_or(LedgerError::JobNotFound(job_id))
    }

    fn attempt(&self, job_id: JobId, attempt_number: u32) -> Result<&Attempt, LedgerError> {
        self.job(job_id)?
            .attempt(attempt_number)
            .ok_or(LedgerError::AttemptNotFound { job_id, attempt_number })
    }
}

#[cfg(test)]
#[path = "../ledger_tests.rs"]
mod tests;
