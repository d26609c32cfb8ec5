// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{ConfigType, JobId, JobStatus, LedgerEvent};
use std::path::PathBuf;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::attempt::AttemptStatus;
    use crate::job::{ConfigType, JobStatus};
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Running),
            Just(JobStatus::Incomplete),
            Just(JobStatus::Failed),
            Just(JobStatus::Succeeded),
            Just(JobStatus::Cancelled),
        ]
    }

    pub fn arb_attempt_status() -> impl Strategy<Value = AttemptStatus> {
        prop_oneof![
            Just(AttemptStatus::Running),
            Just(AttemptStatus::Failed),
            Just(AttemptStatus::Succeeded),
        ]
    }

    pub fn arb_config_type() -> impl Strategy<Value = ConfigType> {
        prop_oneof![
            Just(ConfigType::Sync),
            Just(ConfigType::ResetConnection),
            Just(ConfigType::CheckConnectionSource),
            Just(ConfigType::CheckConnectionDestination),
            Just(ConfigType::DiscoverSchema),
            Just(ConfigType::GetSpec),
        ]
    }
}

// ── Event factory functions ─────────────────────────────────────────────────

pub fn job_enqueued_event(id: i64, scope: &str) -> LedgerEvent {
    job_enqueued_event_of(id, scope, ConfigType::Sync)
}

pub fn job_enqueued_event_of(id: i64, scope: &str, config_type: ConfigType) -> LedgerEvent {
    LedgerEvent::JobEnqueued {
        id: JobId(id),
        scope: scope.to_string(),
        config_type,
        config: serde_json::Value::Null,
        at_ms: 1_000_000,
    }
}

pub fn job_status_event(id: i64, status: JobStatus) -> LedgerEvent {
    LedgerEvent::JobStatusChanged { id: JobId(id), status, at_ms: 1_000_000 }
}

pub fn attempt_created_event(job_id: i64, attempt_number: u32) -> LedgerEvent {
    LedgerEvent::AttemptCreated {
        job_id: JobId(job_id),
        attempt_number,
        log_path: PathBuf::from(format!("/test/logs/{job_id}/{attempt_number}/logs.log")),
        at_ms: 1_000_000,
    }
}

pub fn attempt_failed_event(job_id: i64, attempt_number: u32) -> LedgerEvent {
    LedgerEvent::AttemptFailed { job_id: JobId(job_id), attempt_number, at_ms: 1_000_000 }
}

pub fn attempt_succeeded_event(job_id: i64, attempt_number: u32) -> LedgerEvent {
    LedgerEvent::AttemptSucceeded { job_id: JobId(job_id), attempt_number, at_ms: 1_000_000 }
}
