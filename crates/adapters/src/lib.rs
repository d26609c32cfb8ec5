// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ferry-adapters: boundaries to the workflow engine and heartbeat sources

pub mod heartbeat;
pub mod workflow;

pub use heartbeat::{HeartbeatError, HeartbeatSource, TokenHeartbeat};
pub use workflow::{EngineError, ProcessDescription, ProcessStatus, WorkflowEngine};

#[cfg(any(test, feature = "test-support"))]
pub use heartbeat::FakeHeartbeat;
#[cfg(any(test, feature = "test-support"))]
pub use workflow::{EngineCall, FakeWorkflowEngine};
