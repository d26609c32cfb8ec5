// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and status state machine.

use crate::attempt::{Attempt, AttemptStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric job identifier, assigned sequentially by the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl JobId {
    /// Sentinel reported by coordination processes that are not driving a job.
    pub const NON_RUNNING: JobId = JobId(-1);

    pub fn get(self) -> i64 {
        self.0
    }

    /// Parse a job id from its string form.
    ///
    /// Synchronous jobs (check, discover, spec) are identified by UUIDs and
    /// have no ledger row; they return `None` here.
    pub fn parse(s: &str) -> Option<JobId> {
        s.trim().parse::<i64>().ok().map(JobId)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        JobId(id)
    }
}

/// Category of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    Sync,
    ResetConnection,
    CheckConnectionSource,
    CheckConnectionDestination,
    DiscoverSchema,
    GetSpec,
}

impl ConfigType {
    /// Config types that move data and are single-flighted per scope.
    pub const REPLICATION: [ConfigType; 2] = [ConfigType::Sync, ConfigType::ResetConnection];

    pub fn is_replication(self) -> bool {
        Self::REPLICATION.contains(&self)
    }
}

crate::simple_display! {
    ConfigType {
        Sync => "sync",
        ResetConnection => "reset_connection",
        CheckConnectionSource => "check_connection_source",
        CheckConnectionDestination => "check_connection_destination",
        DiscoverSchema => "discover_schema",
        GetSpec => "get_spec",
    }
}

/// Job status.
///
/// ```text
/// PENDING -> RUNNING -> { SUCCEEDED, FAILED, INCOMPLETE }
/// INCOMPLETE -> RUNNING (next attempt) | SUCCEEDED
/// PENDING | RUNNING | INCOMPLETE -> { CANCELLED, FAILED, PENDING (reset) }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    /// An attempt failed; the job may be retried with a new attempt.
    Incomplete,
    Failed,
    Succeeded,
    Cancelled,
}

impl JobStatus {
    pub const TERMINAL: [JobStatus; 3] =
        [JobStatus::Failed, JobStatus::Succeeded, JobStatus::Cancelled];
    pub const NON_TERMINAL: [JobStatus; 3] =
        [JobStatus::Pending, JobStatus::Running, JobStatus::Incomplete];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    /// Whether `self -> next` is an edge of the state machine.
    ///
    /// Terminal statuses have no outgoing edges. Re-applying the current
    /// non-terminal status is allowed so status writes can be retried.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        if self.is_terminal() {
            return false;
        }
        if self == next {
            return true;
        }
        match next {
            Pending | Cancelled | Failed => true,
            Running => matches!(self, Pending | Incomplete),
            Incomplete => self == Running,
            Succeeded => matches!(self, Running | Incomplete),
        }
    }

    pub fn validate_transition(self, next: JobStatus) -> Result<(), TransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError { from: self, to: next })
        }
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Incomplete => "incomplete",
        Failed => "failed",
        Succeeded => "succeeded",
        Cancelled => "cancelled",
    }
}

/// A status change that is not an edge of the job state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job status transition {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// One logical unit of scheduled work for a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Pipeline the job belongs to (e.g. a connection id)
    pub scope: String,
    pub config_type: ConfigType,
    /// Opaque job configuration, owned by the caller
    pub config: serde_json::Value,
    pub status: JobStatus,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Set when the first attempt is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn has_running_attempt(&self) -> bool {
        self.running_attempt().is_some()
    }

    pub fn running_attempt(&self) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.status == AttemptStatus::Running)
    }

    /// Number of attempts created so far; also the next attempt number.
    pub fn attempts_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    pub fn attempt(&self, attempt_number: u32) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.attempt_number == attempt_number)
    }

    pub fn attempt_mut(&mut self, attempt_number: u32) -> Option<&mut Attempt> {
        self.attempts.iter_mut().find(|a| a.attempt_number == attempt_number)
    }

    pub fn last_attempt(&self) -> Option<&Attempt> {
        self.attempts.iter().max_by_key(|a| a.attempt_number)
    }

    pub fn successful_attempt(&self) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.status == AttemptStatus::Succeeded)
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            scope: String = "connection-1",
        }
        set {
            id: JobId = JobId(1),
            config_type: ConfigType = ConfigType::Sync,
            config: serde_json::Value = serde_json::Value::Null,
            status: JobStatus = JobStatus::Pending,
            attempts: Vec<Attempt> = Vec::new(),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            started_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
