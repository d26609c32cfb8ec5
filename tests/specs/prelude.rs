// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared imports and fixtures for the specs.

pub use ferry_adapters::{
    EngineCall, FakeHeartbeat, FakeWorkflowEngine, HeartbeatSource, ProcessStatus, TokenHeartbeat,
};
pub use ferry_core::{
    process_name, AttemptFailureSummary, AttemptStatus, ConfigType, FailureReason, FakeClock, JobId,
    JobStatus, WorkflowState,
};
pub use ferry_engine::{
    ActivitiesConfig, CoordinatorError, JobActivities, Worker, WorkerContext, WorkerError,
    WorkflowCoordinator,
};
pub use ferry_storage::{JobLedger, LedgerError};
pub use std::path::Path;
pub use std::sync::Arc;
pub use std::time::Duration;
pub use tempfile::{tempdir, TempDir};

pub fn durable_ledger(dir: &Path, clock: FakeClock) -> Arc<JobLedger<FakeClock>> {
    Arc::new(JobLedger::open(dir, clock).unwrap())
}

pub fn null() -> serde_json::Value {
    serde_json::Value::Null
}
