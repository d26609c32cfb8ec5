// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ferry-storage: the durable job ledger

mod error;
mod ledger;
mod retention;
mod snapshot;
mod state;
mod wal;

pub use error::LedgerError;
pub use ledger::{AttemptStats, JobLedger};
pub use retention::RetentionPolicy;
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::LedgerState;
pub use wal::{Wal, WalEntry, WalError};
