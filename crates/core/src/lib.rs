// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ferry-core: jobs, attempts, ledger events and coordination signals

pub mod macros;

pub mod attempt;
pub mod clock;
pub mod event;
pub mod id;
pub mod job;
pub mod signal;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use attempt::{
    Attempt, AttemptFailureSummary, AttemptStatus, FailureOrigin, FailureReason, FailureType,
    StreamSyncStats, SyncStats,
};
#[cfg(any(test, feature = "test-support"))]
pub use attempt::AttemptBuilder;
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::LedgerEvent;
pub use id::RunId;
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{ConfigType, Job, JobId, JobStatus, TransitionError};
pub use signal::{
    process_name, JobInformation, ProcessInput, ProcessSignal, WorkflowState, PROCESS_NAME_PREFIX,
};
