// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activities a coordination process invokes to drive a job through the
//! ledger: job and attempt bookkeeping, plus running an attempt with retries.

use crate::attempt::{
    AttemptRunner, AttemptRunnerConfig, AttemptTarget, Worker, DEFAULT_HEARTBEAT_INTERVAL,
};
use crate::error::{ActivityError, WorkerError};
use crate::log_paths;
use crate::retry::{RetryCoordinator, RetryOutcome};
use ferry_adapters::HeartbeatSource;
use ferry_core::{AttemptFailureSummary, Clock, ConfigType, JobId, JobStatus};
use ferry_storage::{JobLedger, LedgerError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_SYNC_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct ActivitiesConfig {
    pub workspace_root: PathBuf,
    pub max_sync_retries: u32,
    pub heartbeat_interval: Duration,
    pub processing_queue: Option<String>,
}

impl ActivitiesConfig {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            max_sync_retries: DEFAULT_MAX_SYNC_RETRIES,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            processing_queue: None,
        }
    }

    ferry_core::setters! {
        set { max_sync_retries: u32, heartbeat_interval: Duration }
        option { processing_queue: String }
    }

    fn runner_config(&self) -> AttemptRunnerConfig {
        AttemptRunnerConfig::new(&self.workspace_root).heartbeat_interval(self.heartbeat_interval)
    }
}

pub struct JobActivities<C: Clock, H: HeartbeatSource> {
    ledger: Arc<JobLedger<C>>,
    heartbeat: H,
    config: ActivitiesConfig,
}

impl<C: Clock, H: HeartbeatSource> JobActivities<C, H> {
    pub fn new(ledger: Arc<JobLedger<C>>, heartbeat: H, config: ActivitiesConfig) -> Self {
        Self { ledger, heartbeat, config }
    }

    pub fn ledger(&self) -> &Arc<JobLedger<C>> {
        &self.ledger
    }

    /// Enqueue a job for `scope`, first failing any non-terminal replication
    /// job a previous coordination run abandoned.
    pub fn create_new_job(
        &self,
        scope: &str,
        config_type: ConfigType,
        config: serde_json::Value,
    ) -> Result<JobId, ActivityError> {
        let abandoned = self.ledger.non_terminal_jobs(scope);
        for job in abandoned.iter().filter(|j| j.config_type.is_replication()) {
            tracing::warn!(job_id = %job.id, scope, status = %job.status, "failing abandoned job");
            if job.status == JobStatus::Running {
                if let Some(attempt) = job.running_attempt() {
                    self.ledger.fail_attempt(job.id, attempt.attempt_number)?;
                }
            }
            self.ledger.fail_job(job.id)?;
        }

        let job_id = self.ledger.enqueue(scope, config_type, config)?.ok_or_else(|| {
            LedgerError::InvariantViolation(format!(
                "scope {scope} still has an active replication job after failing abandoned jobs"
            ))
        })?;
        Ok(job_id)
    }

    /// Open the next attempt for `job_id`, with its log under the workspace.
    pub fn create_new_attempt(&self, job_id: JobId) -> Result<u32, ActivityError> {
        let expected = self.ledger.get_job(job_id)?.attempts_count();
        let log_path =
            log_paths::attempt_log_path(&self.config.workspace_root, &job_id.to_string(), expected);
        let attempt_number = self.ledger.create_attempt(job_id, &log_path)?;
        if attempt_number != expected {
            tracing::warn!(
                job_id = %job_id,
                expected,
                attempt_number,
                "attempt number raced with another writer"
            );
        }
        Ok(attempt_number)
    }

    pub fn job_success(
        &self,
        job_id: JobId,
        attempt_number: u32,
        output: serde_json::Value,
    ) -> Result<(), ActivityError> {
        self.ledger.write_attempt_output(job_id, attempt_number, output)?;
        self.ledger.succeed_attempt(job_id, attempt_number)?;
        Ok(())
    }

    pub fn attempt_failure(
        &self,
        job_id: JobId,
        attempt_number: u32,
        output: Option<serde_json::Value>,
        summary: AttemptFailureSummary,
    ) -> Result<(), ActivityError> {
        self.ledger.fail_attempt(job_id, attempt_number)?;
        self.ledger.write_attempt_failure_summary(job_id, attempt_number, summary)?;
        if let Some(output) = output {
            self.ledger.write_attempt_output(job_id, attempt_number, output)?;
        }
        Ok(())
    }

    pub fn job_failure(&self, job_id: JobId, reason: &str) -> Result<(), ActivityError> {
        tracing::warn!(job_id = %job_id, reason, "failing job");
        self.ledger.fail_job(job_id)?;
        Ok(())
    }

    pub fn job_cancelled(
        &self,
        job_id: JobId,
        attempt_number: u32,
        summary: AttemptFailureSummary,
    ) -> Result<(), ActivityError> {
        self.ledger.fail_attempt(job_id, attempt_number)?;
        self.ledger.write_attempt_failure_summary(job_id, attempt_number, summary)?;
        self.ledger.cancel_job(job_id)?;
        Ok(())
    }

    /// Run `make_worker`'s work for an attempt, retrying while
    /// `should_retry` accepts the output, and persist the last output.
    #[allow(clippy::too_many_arguments)]
    pub async fn run_attempt_with_retries<I, O, W, F, P, N>(
        &self,
        job_id: JobId,
        attempt_number: u32,
        workflow_id: &str,
        make_worker: F,
        initial: I,
        should_retry: P,
        next_input: N,
    ) -> Result<RetryOutcome<O>, ActivityError>
    where
        I: Clone + Send + 'static,
        O: Serialize + Send + 'static,
        W: Worker<I, O>,
        F: Fn() -> Result<W, WorkerError>,
        P: Fn(&O) -> bool,
        N: Fn(&I, &O) -> I,
    {
        let mut target = AttemptTarget::ledger(job_id, attempt_number, workflow_id);
        target.processing_queue = self.config.processing_queue.clone();
        let target = &target;
        let make_worker = &make_worker;

        let outcome = RetryCoordinator::new(self.config.max_sync_retries)
            .run(
                initial,
                |retry, input| {
                    tracing::debug!(job_id = %job_id, attempt_number, retry, "running attempt");
                    let runner = AttemptRunner::new(
                        Arc::clone(&self.ledger),
                        self.heartbeat.clone(),
                        self.config.runner_config(),
                    );
                    async move { runner.run(target, make_worker, move || Ok(input)).await }
                },
                should_retry,
                next_input,
            )
            .await;

        if let Some(last) = outcome.last_output() {
            self.ledger.write_attempt_output(job_id, attempt_number, serde_json::to_value(last)?)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "activities_tests.rs"]
mod tests;
