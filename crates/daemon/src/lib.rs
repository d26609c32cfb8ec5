// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ferry daemon library
//!
//! Lifecycle and configuration of `ferryd`, exposed for the binary and tests.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;

pub use lifecycle::{
    reconcile_attempts, startup, Config, DaemonState, LifecycleError, MaintenanceReport,
    ReconcileReport,
};
