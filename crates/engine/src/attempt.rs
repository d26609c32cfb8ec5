// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt runner: executes one unit of work under heartbeat-driven
//! cancellation.
//!
//! The work runs on a blocking thread. A timer task polls the heartbeat
//! source; when it reports cancellation the worker's cancel hook runs, the
//! stop token fires, and the outcome resolves to `Cancelled` even if the
//! work later returns successfully.

use crate::attempt_logger::AttemptLogger;
use crate::error::WorkerError;
use crate::log_paths;
use ferry_adapters::{HeartbeatError, HeartbeatSource};
use ferry_core::{Clock, JobId};
use ferry_storage::JobLedger;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// A unit of blocking work executed by an attempt.
pub trait Worker<I, O>: Send + Sync + 'static {
    fn run(&self, input: I, ctx: &WorkerContext) -> Result<O, WorkerError>;

    /// Ask in-flight work to stop. Called at most once per attempt.
    fn cancel(&self);
}

/// What a worker sees while it runs.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub job_root: PathBuf,
    pub stop: CancellationToken,
}

impl WorkerContext {
    /// Long-running workers poll this to honor cancellation.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// Identifies the attempt a runner executes for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptTarget {
    /// Ledger job id, or a random id for synchronous jobs with no ledger row
    pub job_id: String,
    pub attempt_number: u32,
    pub workflow_id: String,
    pub processing_queue: Option<String>,
}

impl AttemptTarget {
    pub fn ledger(job_id: JobId, attempt_number: u32, workflow_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.to_string(),
            attempt_number,
            workflow_id: workflow_id.into(),
            processing_queue: None,
        }
    }

    /// Target for check/discover/spec jobs, which never touch the ledger.
    pub fn synchronous(workflow_id: impl Into<String>) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            attempt_number: 0,
            workflow_id: workflow_id.into(),
            processing_queue: None,
        }
    }

    ferry_core::setters! {
        option { processing_queue: String }
    }

    fn ledger_job_id(&self) -> Option<JobId> {
        JobId::parse(&self.job_id)
    }
}

#[derive(Debug, Clone)]
pub struct AttemptRunnerConfig {
    pub workspace_root: PathBuf,
    pub heartbeat_interval: Duration,
}

impl AttemptRunnerConfig {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    ferry_core::setters! {
        set { heartbeat_interval: Duration }
    }
}

#[derive(Debug)]
pub enum AttemptOutcome<O> {
    Completed(O),
    Cancelled,
    Failed(WorkerError),
}

impl<O> AttemptOutcome<O> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AttemptOutcome::Cancelled)
    }

    pub fn completed(self) -> Option<O> {
        match self {
            AttemptOutcome::Completed(output) => Some(output),
            AttemptOutcome::Cancelled | AttemptOutcome::Failed(_) => None,
        }
    }
}

/// Runs the cancel hook and fires the stop token, once.
struct Teardown {
    done: AtomicBool,
    cancel_hook: Box<dyn Fn() + Send + Sync>,
    stop: CancellationToken,
}

impl Teardown {
    fn run(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        (self.cancel_hook)();
        self.stop.cancel();
    }
}

pub struct AttemptRunner<H: HeartbeatSource, C: Clock> {
    ledger: Arc<JobLedger<C>>,
    heartbeat: H,
    config: AttemptRunnerConfig,
}

impl<H: HeartbeatSource, C: Clock> AttemptRunner<H, C> {
    pub fn new(ledger: Arc<JobLedger<C>>, heartbeat: H, config: AttemptRunnerConfig) -> Self {
        Self { ledger, heartbeat, config }
    }

    pub fn job_root(&self, target: &AttemptTarget) -> PathBuf {
        log_paths::attempt_root(&self.config.workspace_root, &target.job_id, target.attempt_number)
    }

    /// Execute one attempt.
    ///
    /// `input` is evaluated on the worker thread, after the pre-start
    /// cancellation check.
    pub async fn run<I, O, W, F, S>(
        &self,
        target: &AttemptTarget,
        make_worker: F,
        input: S,
    ) -> AttemptOutcome<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        W: Worker<I, O>,
        F: FnOnce() -> Result<W, WorkerError>,
        S: FnOnce() -> Result<I, WorkerError> + Send + 'static,
    {
        let job_root = self.job_root(target);
        let logger = AttemptLogger::new(log_paths::attempt_log_path(
            &self.config.workspace_root,
            &target.job_id,
            target.attempt_number,
        ));

        let worker = match self.prepare(target, &job_root, make_worker) {
            Ok(worker) => Arc::new(worker),
            Err(e) => {
                tracing::error!(
                    job_id = %target.job_id,
                    attempt = target.attempt_number,
                    error = %e,
                    "attempt setup failed"
                );
                logger.append(&format!("setup failed: {e}"));
                return AttemptOutcome::Failed(e);
            }
        };

        let stop = CancellationToken::new();
        let teardown = Arc::new(Teardown {
            done: AtomicBool::new(false),
            cancel_hook: {
                let worker = Arc::clone(&worker);
                Box::new(move || worker.cancel())
            },
            stop: stop.clone(),
        });

        match self.heartbeat.heartbeat().await {
            Err(e) if e.is_cancellation() => {
                teardown.run();
                tracing::info!(
                    job_id = %target.job_id,
                    attempt = target.attempt_number,
                    "attempt cancelled before start"
                );
                logger.append("cancelled before start");
                return AttemptOutcome::Cancelled;
            }
            Err(e) => log_heartbeat_error(target, &e),
            Ok(()) => {}
        }

        tracing::info!(
            job_id = %target.job_id,
            attempt = target.attempt_number,
            workflow_id = %target.workflow_id,
            "attempt starting"
        );
        logger.append(&format!(
            "starting attempt {} (workflow {})",
            target.attempt_number, target.workflow_id
        ));

        let ctx = WorkerContext { job_root, stop: stop.clone() };
        let mut work = tokio::task::spawn_blocking(move || {
            let input = input()?;
            worker.run(input, &ctx)
        });

        let checker = tokio::spawn(heartbeat_loop(
            self.heartbeat.clone(),
            self.config.heartbeat_interval,
            Arc::clone(&teardown),
            target.clone(),
        ));

        let outcome = tokio::select! {
            biased;
            _ = stop.cancelled() => AttemptOutcome::Cancelled,
            joined = &mut work => match joined {
                // Cancellation may land between the work returning and this arm
                _ if stop.is_cancelled() => AttemptOutcome::Cancelled,
                Ok(Ok(output)) => AttemptOutcome::Completed(output),
                Ok(Err(e)) => AttemptOutcome::Failed(e),
                Err(e) => AttemptOutcome::Failed(WorkerError::Panicked(e.to_string())),
            },
        };
        checker.abort();

        match &outcome {
            AttemptOutcome::Completed(_) => {
                tracing::info!(
                    job_id = %target.job_id,
                    attempt = target.attempt_number,
                    "attempt completed"
                );
                logger.append("attempt completed");
            }
            AttemptOutcome::Cancelled => {
                tracing::info!(
                    job_id = %target.job_id,
                    attempt = target.attempt_number,
                    "attempt cancelled"
                );
                logger.append("attempt cancelled");
            }
            AttemptOutcome::Failed(e) => {
                tracing::warn!(
                    job_id = %target.job_id,
                    attempt = target.attempt_number,
                    error = %e,
                    "attempt failed"
                );
                logger.append(&format!("attempt failed: {e}"));
            }
        }
        outcome
    }

    fn prepare<W, F>(
        &self,
        target: &AttemptTarget,
        job_root: &Path,
        make_worker: F,
    ) -> Result<W, WorkerError>
    where
        F: FnOnce() -> Result<W, WorkerError>,
    {
        std::fs::create_dir_all(job_root)?;
        if let Some(job_id) = target.ledger_job_id() {
            self.ledger.set_attempt_workflow_info(
                job_id,
                target.attempt_number,
                &target.workflow_id,
                target.processing_queue.as_deref(),
            )?;
        }
        make_worker()
    }
}

async fn heartbeat_loop<H: HeartbeatSource>(
    heartbeat: H,
    period: Duration,
    teardown: Arc<Teardown>,
    target: AttemptTarget,
) {
    let mut ticker = tokio::time::interval(period);
    // First tick completes immediately; the pre-start check already covered it
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = teardown.stop.cancelled() => break,
            _ = ticker.tick() => {}
        }
        match heartbeat.heartbeat().await {
            Ok(()) => {}
            Err(e) if e.is_cancellation() => {
                tracing::info!(
                    job_id = %target.job_id,
                    attempt = target.attempt_number,
                    "heartbeat reported cancellation"
                );
                teardown.run();
                break;
            }
            Err(e) => log_heartbeat_error(&target, &e),
        }
    }
}

fn log_heartbeat_error(target: &AttemptTarget, error: &HeartbeatError) {
    tracing::warn!(
        job_id = %target.job_id,
        attempt = target.attempt_number,
        error = %error,
        "heartbeat failed, continuing"
    );
}

#[cfg(test)]
#[path = "attempt_tests.rs"]
mod tests;
