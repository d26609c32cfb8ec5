// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only ledger queries. All return owned copies.

use super::JobLedger;
use crate::error::LedgerError;
use crate::state::LedgerState;
use ferry_core::{Clock, ConfigType, Job, JobId, JobStatus, StreamSyncStats, SyncStats};
use std::cmp::Reverse;

/// Stats recorded for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptStats {
    pub combined: Option<SyncStats>,
    pub streams: Vec<StreamSyncStats>,
}

impl<C: Clock> JobLedger<C> {
    pub fn get_job(&self, job_id: JobId) -> Result<Job, LedgerError> {
        self.inner.lock().job(job_id).cloned()
    }

    /// Jobs of the given types, newest first, optionally restricted to a scope.
    pub fn list_jobs(
        &self,
        config_types: &[ConfigType],
        scope: Option<&str>,
        page_size: usize,
        offset: usize,
    ) -> Vec<Job> {
        let inner = self.inner.lock();
        newest_first(&inner.state, |job| {
            config_types.contains(&job.config_type) && scope.map_or(true, |s| job.scope == s)
        })
        .into_iter()
        .skip(offset)
        .take(page_size)
        .collect()
    }

    pub fn list_jobs_with_status(
        &self,
        config_types: &[ConfigType],
        status: JobStatus,
    ) -> Vec<Job> {
        let inner = self.inner.lock();
        newest_first(&inner.state, |job| {
            config_types.contains(&job.config_type) && job.status == status
        })
    }

    /// Most recent sync or reset job for `scope`, whatever its status.
    pub fn last_replication_job(&self, scope: &str) -> Option<Job> {
        let inner = self.inner.lock();
        newest_first(&inner.state, |job| job.scope == scope && job.config_type.is_replication())
            .into_iter()
            .next()
    }

    /// Non-terminal jobs for `scope`, oldest first.
    pub fn non_terminal_jobs(&self, scope: &str) -> Vec<Job> {
        let inner = self.inner.lock();
        let mut jobs: Vec<Job> =
            inner.state.jobs_for_scope(scope).filter(|job| !job.is_terminal()).cloned().collect();
        jobs.sort_by_key(|job| (job.created_at_ms, job.id));
        jobs
    }

    /// RUNNING jobs whose scope is one of `scopes`.
    pub fn running_jobs_for_scopes(&self, scopes: &[String]) -> Vec<Job> {
        let inner = self.inner.lock();
        newest_first(&inner.state, |job| {
            job.status == JobStatus::Running && scopes.iter().any(|s| *s == job.scope)
        })
    }

    /// `(job_id, attempt_number)` of every attempt still marked RUNNING.
    pub fn running_attempts(&self) -> Vec<(JobId, u32)> {
        let inner = self.inner.lock();
        inner
            .state
            .jobs
            .values()
            .flat_map(|job| job.attempts.iter().filter(|a| a.is_running()))
            .map(|a| (a.job_id, a.attempt_number))
            .collect()
    }

    pub fn attempt_workflow_id(
        &self,
        job_id: JobId,
        attempt_number: u32,
    ) -> Result<Option<String>, LedgerError> {
        let inner = self.inner.lock();
        Ok(inner.attempt(job_id, attempt_number)?.workflow_id.clone())
    }

    pub fn attempt_stats(
        &self,
        job_id: JobId,
        attempt_number: u32,
    ) -> Result<AttemptStats, LedgerError> {
        let inner = self.inner.lock();
        let attempt = inner.attempt(job_id, attempt_number)?;
        Ok(AttemptStats {
            combined: attempt.sync_stats.clone(),
            streams: attempt.stream_stats.clone(),
        })
    }

    /// Copy of the whole materialized state.
    pub fn state(&self) -> LedgerState {
        self.inner.lock().state.clone()
    }
}

fn newest_first(state: &LedgerState, keep: impl Fn(&Job) -> bool) -> Vec<Job> {
    let mut jobs: Vec<Job> = state.jobs.values().filter(|job| keep(job)).cloned().collect();
    jobs.sort_by_key(|job| Reverse((job.created_at_ms, job.id)));
    jobs
}
