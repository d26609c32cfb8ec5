// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination-process management: lookup, signalling and self-healing
//! repair of the long-lived per-pipeline process hosted by the engine.

use crate::error::CoordinatorError;
use ferry_adapters::{EngineError, ProcessStatus, WorkflowEngine};
use ferry_core::{process_name, JobId, ProcessInput, ProcessSignal, WorkflowState};

const REPAIR_TERMINATE_REASON: &str = "terminating unreachable coordination process before repair";
const RESTART_TERMINATE_REASON: &str = "operator restart";

/// Classification of a coordination process before signalling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessLookup {
    Healthy(WorkflowState),
    /// Reachable but self-reported broken
    Quarantined(WorkflowState),
    /// Completed and self-marked deleted; must never be restarted
    Deleted,
    Unreachable(EngineError),
    /// Closed without the deleted flag
    CompletedUnexpectedly(ProcessStatus),
}

/// A coordination process that accepted a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub scope: String,
    pub name: String,
    /// Whether the process had to be re-created to deliver the signal
    pub repaired: bool,
}

/// Result of an operator-initiated operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManualOperationResult {
    pub failing_reason: Option<String>,
    pub job_id: Option<JobId>,
}

impl ManualOperationResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self { failing_reason: Some(reason.into()), job_id: None }
    }

    pub fn succeeded(job_id: JobId) -> Self {
        Self { failing_reason: None, job_id: Some(job_id) }
    }

    pub fn is_success(&self) -> bool {
        self.failing_reason.is_none()
    }
}

#[derive(Clone)]
pub struct WorkflowCoordinator<E: WorkflowEngine> {
    engine: E,
}

impl<E: WorkflowEngine> WorkflowCoordinator<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub async fn lookup(&self, scope: &str) -> ProcessLookup {
        let name = process_name(scope);
        let description = match self.engine.describe(&name).await {
            Ok(d) => d,
            Err(e) => return ProcessLookup::Unreachable(e),
        };
        tracing::trace!(
            scope,
            run_id = %description.run_id,
            status = %description.status,
            "described process"
        );
        if description.status.is_closed() {
            if description.state.deleted {
                return ProcessLookup::Deleted;
            }
            if description.status == ProcessStatus::Completed {
                return ProcessLookup::CompletedUnexpectedly(description.status);
            }
            return ProcessLookup::Unreachable(EngineError::NotFound(format!(
                "{name} is {}",
                description.status
            )));
        }
        if description.state.quarantined {
            return ProcessLookup::Quarantined(description.state);
        }
        ProcessLookup::Healthy(description.state)
    }

    /// Deliver `signal` to the scope's process, re-creating the process
    /// first if it cannot receive signals.
    pub async fn signal_and_repair_if_necessary(
        &self,
        scope: &str,
        signal: ProcessSignal,
    ) -> Result<ProcessHandle, CoordinatorError> {
        let name = process_name(scope);
        match self.lookup(scope).await {
            ProcessLookup::Healthy(_) => match self.engine.signal(&name, signal.clone()).await {
                Ok(()) => {
                    tracing::debug!(
                        scope,
                        signal = signal.name(),
                        "signalled coordination process"
                    );
                    Ok(ProcessHandle { scope: scope.to_string(), name, repaired: false })
                }
                Err(e @ EngineError::NotFound(_)) => {
                    tracing::warn!(scope, error = %e, "process vanished before signal, repairing");
                    self.repair(scope, signal).await
                }
                Err(e) => Err(e.into()),
            },
            ProcessLookup::Quarantined(_) => {
                tracing::warn!(scope, "coordination process quarantined, repairing");
                self.repair(scope, signal).await
            }
            ProcessLookup::Unreachable(e) => {
                tracing::warn!(scope, error = %e, "coordination process unreachable, repairing");
                self.repair(scope, signal).await
            }
            ProcessLookup::Deleted => {
                tracing::info!(
                    scope,
                    signal = signal.name(),
                    "coordination process deleted, not signalling"
                );
                Err(CoordinatorError::Deleted { scope: scope.to_string() })
            }
            ProcessLookup::CompletedUnexpectedly(status) => {
                tracing::error!(
                    scope,
                    %status,
                    signal = signal.name(),
                    "coordination process closed without deleted flag; use restart to recover"
                );
                Err(CoordinatorError::CompletedUnexpectedly { scope: scope.to_string(), status })
            }
        }
    }

    async fn repair(
        &self,
        scope: &str,
        signal: ProcessSignal,
    ) -> Result<ProcessHandle, CoordinatorError> {
        let name = process_name(scope);
        if let Err(e) = self.engine.terminate(&name, REPAIR_TERMINATE_REASON).await {
            tracing::debug!(scope, error = %e, "terminate before repair failed, ignoring");
        }
        self.engine.signal_with_start(&name, ProcessInput::initial(scope), signal.clone()).await?;
        tracing::info!(scope, signal = signal.name(), "coordination process repaired");
        Ok(ProcessHandle { scope: scope.to_string(), name, repaired: true })
    }

    /// Start a fresh process for a newly created pipeline. Already running is fine.
    pub async fn start(&self, scope: &str) -> Result<ProcessHandle, CoordinatorError> {
        let name = process_name(scope);
        match self.engine.start_process(&name, ProcessInput::initial(scope)).await {
            Ok(()) => tracing::info!(scope, "coordination process started"),
            Err(EngineError::AlreadyStarted(_)) => {
                tracing::debug!(scope, "coordination process already running")
            }
            Err(e) => return Err(e.into()),
        }
        Ok(ProcessHandle { scope: scope.to_string(), name, repaired: false })
    }

    /// Request an immediate sync; refused while one is already running.
    pub async fn sync_now(&self, scope: &str) -> Result<ManualOperationResult, CoordinatorError> {
        if let ProcessLookup::Healthy(state) = self.lookup(scope).await {
            if state.running {
                return Ok(ManualOperationResult::failed(format!(
                    "A sync is already running for: {scope}"
                )));
            }
        }
        self.manual_operation(scope, ProcessSignal::SubmitManualSync).await
    }

    pub async fn cancel(&self, scope: &str) -> Result<ManualOperationResult, CoordinatorError> {
        self.manual_operation(scope, ProcessSignal::CancelJob).await
    }

    pub async fn reset(&self, scope: &str) -> Result<ManualOperationResult, CoordinatorError> {
        self.manual_operation(scope, ProcessSignal::ResetConnection).await
    }

    async fn manual_operation(
        &self,
        scope: &str,
        signal: ProcessSignal,
    ) -> Result<ManualOperationResult, CoordinatorError> {
        match self.signal_and_repair_if_necessary(scope, signal).await {
            Ok(_) => Ok(ManualOperationResult::succeeded(self.current_job_id(scope).await)),
            Err(CoordinatorError::Deleted { .. }) => {
                Ok(ManualOperationResult::failed(format!("Connection {scope} is deleted")))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update(&self, scope: &str) -> Result<ProcessHandle, CoordinatorError> {
        self.signal_and_repair_if_necessary(scope, ProcessSignal::ConnectionUpdated).await
    }

    pub async fn update_connector_version(
        &self,
        scope: &str,
        version: &str,
    ) -> Result<ProcessHandle, CoordinatorError> {
        let signal = ProcessSignal::UpdateConnectorVersion { version: version.to_string() };
        self.signal_and_repair_if_necessary(scope, signal).await
    }

    pub async fn retry_failed_activity(
        &self,
        scope: &str,
    ) -> Result<ProcessHandle, CoordinatorError> {
        self.signal_and_repair_if_necessary(scope, ProcessSignal::RetryFailedActivity).await
    }

    /// Retire the pipeline's process. Deleting an already deleted process is a no-op.
    pub async fn delete(&self, scope: &str) -> Result<(), CoordinatorError> {
        match self.signal_and_repair_if_necessary(scope, ProcessSignal::DeleteConnection).await {
            Ok(_) => Ok(()),
            Err(CoordinatorError::Deleted { .. }) => {
                tracing::info!(scope, "coordination process already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Operator repair: terminate whatever is there and start fresh.
    pub async fn restart(&self, scope: &str) -> Result<ProcessHandle, CoordinatorError> {
        let name = process_name(scope);
        if let Err(e) = self.engine.terminate(&name, RESTART_TERMINATE_REASON).await {
            tracing::debug!(scope, error = %e, "terminate before restart failed, ignoring");
        }
        self.engine.start_process(&name, ProcessInput::initial(scope)).await?;
        tracing::info!(scope, "coordination process restarted");
        Ok(ProcessHandle { scope: scope.to_string(), name, repaired: true })
    }

    /// Whether the engine reports the process as running. Errors read as `false`.
    pub async fn is_running(&self, scope: &str) -> bool {
        self.engine
            .describe(&process_name(scope))
            .await
            .is_ok_and(|d| d.status == ProcessStatus::Running)
    }

    /// Job the process is currently driving, or `JobId::NON_RUNNING`.
    pub async fn current_job_id(&self, scope: &str) -> JobId {
        match self.engine.query_job_info(&process_name(scope)).await {
            Ok(info) => info.job_id,
            Err(e) => {
                tracing::debug!(scope, error = %e, "job info query failed");
                JobId::NON_RUNNING
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
