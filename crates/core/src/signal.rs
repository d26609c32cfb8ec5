// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination-process contract: signals, self-reported state, start input.

use crate::job::JobId;
use serde::{Deserialize, Serialize};

/// Prefix of every coordination-process name.
pub const PROCESS_NAME_PREFIX: &str = "connection_manager_";

/// Deterministic coordination-process name for a pipeline scope.
pub fn process_name(scope: &str) -> String {
    format!("{PROCESS_NAME_PREFIX}{scope}")
}

/// Signals a coordination process accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum ProcessSignal {
    SubmitManualSync,
    CancelJob,
    ResetConnection,
    ConnectionUpdated,
    DeleteConnection,
    RetryFailedActivity,
    UpdateConnectorVersion { version: String },
}

impl ProcessSignal {
    /// Signal name on the engine's wire.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessSignal::SubmitManualSync => "submitManualSync",
            ProcessSignal::CancelJob => "cancelJob",
            ProcessSignal::ResetConnection => "resetConnection",
            ProcessSignal::ConnectionUpdated => "connectionUpdated",
            ProcessSignal::DeleteConnection => "deleteConnection",
            ProcessSignal::RetryFailedActivity => "retryFailedActivity",
            ProcessSignal::UpdateConnectorVersion { .. } => "updateConnectorVersion",
        }
    }
}

crate::simple_display! {
    ProcessSignal {
        SubmitManualSync => "submit_manual_sync",
        CancelJob => "cancel_job",
        ResetConnection => "reset_connection",
        ConnectionUpdated => "connection_updated",
        DeleteConnection => "delete_connection",
        RetryFailedActivity => "retry_failed_activity",
        UpdateConnectorVersion { .. } => "update_connector_version",
    }
}

/// Flags a coordination process reports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowState {
    /// A sync attempt is in flight
    pub running: bool,
    /// The process retired itself intentionally
    pub deleted: bool,
    /// The process hit an internal invariant violation and is parked
    pub quarantined: bool,
    pub updated: bool,
    pub cancelled: bool,
    pub failed: bool,
    pub success: bool,
    pub reset_connection: bool,
    pub reset_with_scheduling: bool,
    pub cancelled_for_reset: bool,
    pub retry_failed_activity: bool,
    pub skip_scheduling: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_version: Option<String>,
}

impl WorkflowState {
    /// Apply a signal the way a coordination process reacts to it.
    ///
    /// Manual syncs are ignored while running; cancels are ignored while idle.
    pub fn apply(&mut self, signal: &ProcessSignal) {
        match signal {
            ProcessSignal::SubmitManualSync => {
                if !self.running {
                    self.skip_scheduling = true;
                }
            }
            ProcessSignal::CancelJob => {
                if self.running {
                    self.cancelled = true;
                }
            }
            ProcessSignal::DeleteConnection => {
                self.deleted = true;
                if self.running {
                    self.cancelled = true;
                }
            }
            ProcessSignal::ConnectionUpdated => self.updated = true,
            ProcessSignal::ResetConnection => {
                self.reset_connection = true;
                self.reset_with_scheduling = false;
                if self.running {
                    self.cancelled_for_reset = true;
                }
            }
            ProcessSignal::RetryFailedActivity => self.retry_failed_activity = true,
            ProcessSignal::UpdateConnectorVersion { version } => {
                self.connector_version = Some(version.clone());
                self.updated = true;
            }
        }
    }
}

/// The job a coordination process believes it is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInformation {
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_number: Option<u32>,
}

impl JobInformation {
    pub fn non_running() -> Self {
        Self { job_id: JobId::NON_RUNNING, attempt_number: None }
    }
}

/// Input a coordination process is started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInput {
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_number: Option<u32>,
    #[serde(default)]
    pub from_failure: bool,
    #[serde(default)]
    pub reset_connection: bool,
    #[serde(default)]
    pub skip_scheduling: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<WorkflowState>,
}

impl ProcessInput {
    /// Input for a fresh process with no job in flight.
    pub fn initial(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            job_id: None,
            attempt_number: None,
            from_failure: false,
            reset_connection: false,
            skip_scheduling: false,
            state: None,
        }
    }

    pub fn process_name(&self) -> String {
        process_name(&self.scope)
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
