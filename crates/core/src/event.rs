// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger events: the durable record of every job and attempt mutation.
//!
//! Each event describes the complete effect of one ledger operation, so a
//! single WAL append is enough to commit it. Handlers applying these events
//! must be idempotent: replaying the log twice yields the same state.

use crate::attempt::{AttemptFailureSummary, StreamSyncStats, SyncStats};
use crate::job::{ConfigType, JobId, JobStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Serializes with `{"type": "job:enqueued", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    #[serde(rename = "job:enqueued")]
    JobEnqueued {
        id: JobId,
        scope: String,
        config_type: ConfigType,
        #[serde(default)]
        config: serde_json::Value,
        at_ms: u64,
    },

    /// Forced status change (cancel, reset, fail).
    #[serde(rename = "job:status")]
    JobStatusChanged { id: JobId, status: JobStatus, at_ms: u64 },

    /// Attempt inserted RUNNING; the job moves to RUNNING.
    #[serde(rename = "attempt:created")]
    AttemptCreated { job_id: JobId, attempt_number: u32, log_path: PathBuf, at_ms: u64 },

    /// Attempt FAILED; the job moves to INCOMPLETE unless terminal.
    #[serde(rename = "attempt:failed")]
    AttemptFailed { job_id: JobId, attempt_number: u32, at_ms: u64 },

    /// Attempt SUCCEEDED; the job moves to SUCCEEDED unless terminal.
    #[serde(rename = "attempt:succeeded")]
    AttemptSucceeded { job_id: JobId, attempt_number: u32, at_ms: u64 },

    #[serde(rename = "attempt:output")]
    AttemptOutputWritten {
        job_id: JobId,
        attempt_number: u32,
        output: serde_json::Value,
        at_ms: u64,
    },

    #[serde(rename = "attempt:stats")]
    AttemptStatsWritten {
        job_id: JobId,
        attempt_number: u32,
        stats: SyncStats,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        streams: Vec<StreamSyncStats>,
        at_ms: u64,
    },

    #[serde(rename = "attempt:failure_summary")]
    AttemptFailureSummaryWritten {
        job_id: JobId,
        attempt_number: u32,
        summary: AttemptFailureSummary,
        at_ms: u64,
    },

    #[serde(rename = "attempt:workflow")]
    AttemptWorkflowInfoSet {
        job_id: JobId,
        attempt_number: u32,
        workflow_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        processing_queue: Option<String>,
        at_ms: u64,
    },

    /// Retention removed these jobs and their attempts.
    #[serde(rename = "jobs:purged")]
    JobsPurged { ids: Vec<JobId> },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::JobEnqueued { .. } => "job:enqueued",
            LedgerEvent::JobStatusChanged { .. } => "job:status",
            LedgerEvent::AttemptCreated { .. } => "attempt:created",
            LedgerEvent::AttemptFailed { .. } => "attempt:failed",
            LedgerEvent::AttemptSucceeded { .. } => "attempt:succeeded",
            LedgerEvent::AttemptOutputWritten { .. } => "attempt:output",
            LedgerEvent::AttemptStatsWritten { .. } => "attempt:stats",
            LedgerEvent::AttemptFailureSummaryWritten { .. } => "attempt:failure_summary",
            LedgerEvent::AttemptWorkflowInfoSet { .. } => "attempt:workflow",
            LedgerEvent::JobsPurged { .. } => "jobs:purged",
        }
    }

    /// The single job this event touches, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            LedgerEvent::JobEnqueued { id, .. } | LedgerEvent::JobStatusChanged { id, .. } => {
                Some(*id)
            }
            LedgerEvent::AttemptCreated { job_id, .. }
            | LedgerEvent::AttemptFailed { job_id, .. }
            | LedgerEvent::AttemptSucceeded { job_id, .. }
            | LedgerEvent::AttemptOutputWritten { job_id, .. }
            | LedgerEvent::AttemptStatsWritten { job_id, .. }
            | LedgerEvent::AttemptFailureSummaryWritten { job_id, .. }
            | LedgerEvent::AttemptWorkflowInfoSet { job_id, .. } => Some(*job_id),
            LedgerEvent::JobsPurged { .. } => None,
        }
    }

    /// One-line summary for trace logs.
    pub fn log_summary(&self) -> String {
        let name = self.name();
        match self {
            LedgerEvent::JobEnqueued { id, scope, config_type, .. } => {
                format!("{name} id={id} scope={scope} config_type={config_type}")
            }
            LedgerEvent::JobStatusChanged { id, status, .. } => {
                format!("{name} id={id} status={status}")
            }
            LedgerEvent::AttemptCreated { job_id, attempt_number, .. }
            | LedgerEvent::AttemptFailed { job_id, attempt_number, .. }
            | LedgerEvent::AttemptSucceeded { job_id, attempt_number, .. }
            | LedgerEvent::AttemptOutputWritten { job_id, attempt_number, .. }
            | LedgerEvent::AttemptStatsWritten { job_id, attempt_number, .. }
            | LedgerEvent::AttemptFailureSummaryWritten { job_id, attempt_number, .. } => {
                format!("{name} job={job_id} attempt={attempt_number}")
            }
            LedgerEvent::AttemptWorkflowInfoSet { job_id, attempt_number, workflow_id, .. } => {
                format!("{name} job={job_id} attempt={attempt_number} workflow={workflow_id}")
            }
            LedgerEvent::JobsPurged { ids } => format!("{name} count={}", ids.len()),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
