// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ferry_adapters::{EngineError, ProcessStatus};
use ferry_storage::LedgerError;
use thiserror::Error;

/// Errors a worker (or its setup) can fail with.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker failed: {0}")]
    Failed(String),
    #[error("worker input unavailable: {0}")]
    Input(String),
    #[error("worker panicked: {0}")]
    Panicked(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors from coordination-process management.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The process retired itself; it must not be restarted.
    #[error("coordination process for {scope} was deleted")]
    Deleted { scope: String },
    /// The process completed without marking itself deleted.
    #[error("coordination process for {scope} is {status} but not marked deleted")]
    CompletedUnexpectedly { scope: String, status: ProcessStatus },
    #[error("workflow engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Errors from activities invoked by a coordination process.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error("output serialization failed: {0}")]
    Output(#[from] serde_json::Error),
}

impl ActivityError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ActivityError::Ledger(e) => e.is_retryable(),
            ActivityError::Worker(_) | ActivityError::Output(_) => false,
        }
    }
}
