// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger state materialized from WAL replay

mod attempts;
mod jobs;

use ferry_core::{Job, JobId, JobStatus, LedgerEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Jobs and their attempts, built by folding ledger events.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub jobs: BTreeMap<JobId, Job>,
    /// Highest job id ever assigned; survives purges so ids are never reused
    #[serde(default)]
    pub last_job_id: i64,
}

impl LedgerState {
    /// Apply an event to derive state changes.
    ///
    /// # Idempotency Requirement
    ///
    /// **All event handlers MUST be idempotent.** Applying the same event twice
    /// must produce the same state as applying it once, because recovery may
    /// replay WAL entries that are already folded into a snapshot.
    ///
    /// - Guard inserts with existence checks
    /// - Guard status changes with terminality checks
    /// - Only set `ended_at_ms`/`started_at_ms` when unset
    pub fn apply_event(&mut self, event: &LedgerEvent) {
        match event {
            LedgerEvent::JobEnqueued { .. }
            | LedgerEvent::JobStatusChanged { .. }
            | LedgerEvent::JobsPurged { .. } => jobs::apply(self, event),

            LedgerEvent::AttemptCreated { .. }
            | LedgerEvent::AttemptFailed { .. }
            | LedgerEvent::AttemptSucceeded { .. }
            | LedgerEvent::AttemptOutputWritten { .. }
            | LedgerEvent::AttemptStatsWritten { .. }
            | LedgerEvent::AttemptFailureSummaryWritten { .. }
            | LedgerEvent::AttemptWorkflowInfoSet { .. } => attempts::apply(self, event),
        }
    }

    pub fn get_job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn next_job_id(&self) -> JobId {
        JobId(self.last_job_id + 1)
    }

    pub fn jobs_for_scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Job> + 'a {
        self.jobs.values().filter(move |job| job.scope == scope)
    }

    /// A replication-class job for `scope` that has not reached a terminal status.
    pub fn active_replication_job<'a>(&'a self, scope: &'a str) -> Option<&'a Job> {
        self.jobs_for_scope(scope)
            .find(|job| job.config_type.is_replication() && !job.is_terminal())
    }

    /// Whether any job for `scope` is RUNNING or INCOMPLETE.
    pub fn scope_is_busy(&self, scope: &str) -> bool {
        self.jobs_for_scope(scope)
            .any(|job| matches!(job.status, JobStatus::Running | JobStatus::Incomplete))
    }
}

#[cfg(test)]
#[path = "../state_tests.rs"]
mod tests;
