// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempts: one execution try within a job

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Running,
    Failed,
    Succeeded,
}

impl AttemptStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AttemptStatus::Running)
    }
}

crate::simple_display! {
    AttemptStatus {
        Running => "running",
        Failed => "failed",
        Succeeded => "succeeded",
    }
}

/// Record and state-message counters reported by a replication worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncStats {
    pub records_emitted: u64,
    pub bytes_emitted: u64,
    pub records_committed: Option<u64>,
    pub bytes_committed: Option<u64>,
    pub source_state_messages_emitted: u64,
    pub destination_state_messages_emitted: u64,
    pub max_seconds_before_source_state_message_emitted: u64,
    pub mean_seconds_before_source_state_message_emitted: u64,
    pub max_seconds_between_state_message_emitted_and_committed: u64,
    pub mean_seconds_between_state_message_emitted_and_committed: u64,
}

/// Per-stream counters, keyed by `(stream_name, stream_namespace)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSyncStats {
    pub stream_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_namespace: Option<String>,
    pub stats: SyncStats,
}

impl StreamSyncStats {
    pub fn new(stream_name: impl Into<String>, stats: SyncStats) -> Self {
        Self { stream_name: stream_name.into(), stream_namespace: None, stats }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.stream_namespace = Some(namespace.into());
        self
    }

    fn same_stream(&self, other: &StreamSyncStats) -> bool {
        self.stream_name == other.stream_name && self.stream_namespace == other.stream_namespace
    }
}

/// Component that caused an attempt to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureOrigin {
    Source,
    Destination,
    Replication,
    Persistence,
    Normalization,
    Unknown,
}

crate::simple_display! {
    FailureOrigin {
        Source => "source",
        Destination => "destination",
        Replication => "replication",
        Persistence => "persistence",
        Normalization => "normalization",
        Unknown => "unknown",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    ConfigError,
    SystemError,
    ManualCancellation,
    TransientError,
}

crate::simple_display! {
    FailureType {
        ConfigError => "config_error",
        SystemError => "system_error",
        ManualCancellation => "manual_cancellation",
        TransientError => "transient_error",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_origin: Option<FailureOrigin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_type: Option<FailureType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    pub timestamp_ms: u64,
}

impl FailureReason {
    pub fn new(timestamp_ms: u64) -> Self {
        Self {
            failure_origin: None,
            failure_type: None,
            internal_message: None,
            external_message: None,
            stacktrace: None,
            retryable: None,
            timestamp_ms,
        }
    }

    /// Reason recorded when an operator cancels a running attempt.
    pub fn manual_cancellation(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms)
            .failure_type(FailureType::ManualCancellation)
            .external_message("The sync was cancelled.")
    }

    /// Reason recorded for failures inside the orchestrator itself.
    pub fn system(message: impl Into<String>, timestamp_ms: u64) -> Self {
        let message = message.into();
        Self::new(timestamp_ms)
            .failure_origin(FailureOrigin::Replication)
            .failure_type(FailureType::SystemError)
            .internal_message(message.clone())
            .external_message(message)
    }

    crate::setters! {
        option {
            failure_origin: FailureOrigin,
            failure_type: FailureType,
            internal_message: String,
            external_message: String,
            stacktrace: String,
            retryable: bool,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFailureSummary {
    pub failures: Vec<FailureReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_success: Option<bool>,
}

impl AttemptFailureSummary {
    pub fn single(reason: FailureReason) -> Self {
        Self { failures: vec![reason], partial_success: None }
    }

    pub fn partial_success(mut self, partial: bool) -> Self {
        self.partial_success = Some(partial);
        self
    }
}

/// One execution try within a job, identified by `(job_id, attempt_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub job_id: JobId,
    pub attempt_number: u32,
    pub status: AttemptStatus,
    pub log_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_summary: Option<AttemptFailureSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_stats: Option<SyncStats>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stream_stats: Vec<StreamSyncStats>,
    /// Engine correlation id used to route out-of-band cancellation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_queue: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
}

impl Attempt {
    pub fn new(job_id: JobId, attempt_number: u32, log_path: PathBuf, now_ms: u64) -> Self {
        Self {
            job_id,
            attempt_number,
            status: AttemptStatus::Running,
            log_path,
            output: None,
            failure_summary: None,
            sync_stats: None,
            stream_stats: Vec::new(),
            workflow_id: None,
            processing_queue: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            ended_at_ms: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == AttemptStatus::Running
    }

    /// Replace the aggregate stats and upsert each stream entry.
    ///
    /// Streams not present in `streams` keep their previous counters, so
    /// periodic flushes that only report active streams do not lose data.
    pub fn upsert_stats(&mut self, stats: SyncStats, streams: &[StreamSyncStats]) {
        self.sync_stats = Some(stats);
        for incoming in streams {
            match self.stream_stats.iter_mut().find(|s| s.same_stream(incoming)) {
                Some(existing) => existing.stats = incoming.stats.clone(),
                None => self.stream_stats.push(incoming.clone()),
            }
        }
    }
}

crate::builder! {
    pub struct AttemptBuilder => Attempt {
        into {
            log_path: PathBuf = "/tmp/ferry/1/0/logs.log",
        }
        set {
            job_id: JobId = JobId(1),
            attempt_number: u32 = 0,
            status: AttemptStatus = AttemptStatus::Running,
            stream_stats: Vec<StreamSyncStats> = Vec::new(),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            output: serde_json::Value = None,
            failure_summary: AttemptFailureSummary = None,
            sync_stats: SyncStats = None,
            workflow_id: String = None,
            processing_queue: String = None,
            ended_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "attempt_tests.rs"]
mod tests;
