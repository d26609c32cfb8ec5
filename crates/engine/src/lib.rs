// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ferry-engine: attempt execution, retries, coordination-process
//! management and the activities that tie them to the job ledger

mod activities;
mod attempt;
mod attempt_logger;
mod coordinator;
mod error;
pub mod log_paths;
mod retry;

pub use activities::{ActivitiesConfig, JobActivities, DEFAULT_MAX_SYNC_RETRIES};
pub use attempt::{
    AttemptOutcome, AttemptRunner, AttemptRunnerConfig, AttemptTarget, Worker, WorkerContext,
    DEFAULT_HEARTBEAT_INTERVAL,
};
pub use attempt_logger::AttemptLogger;
pub use coordinator::{ManualOperationResult, ProcessHandle, ProcessLookup, WorkflowCoordinator};
pub use error::{ActivityError, CoordinatorError, WorkerError};
pub use retry::{RetryCoordinator, RetryOutcome, StopReason};
