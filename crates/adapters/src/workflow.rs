// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable-workflow engine boundary.
//!
//! The engine hosts one long-lived coordination process per pipeline. The
//! orchestrator only starts, signals, describes, queries and terminates them.

use async_trait::async_trait;
use ferry_core::{JobInformation, ProcessInput, ProcessSignal, RunId, WorkflowState};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("process not found: {0}")]
    NotFound(String),
    #[error("process already started: {0}")]
    AlreadyStarted(String),
    #[error("engine transport error: {0}")]
    Transport(String),
}

/// Execution status the engine reports for a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    Terminated,
    TimedOut,
}

impl ProcessStatus {
    /// Whether the process has stopped executing.
    pub fn is_closed(self) -> bool {
        !matches!(self, ProcessStatus::Running)
    }
}

ferry_core::simple_display! {
    ProcessStatus {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Terminated => "terminated",
        TimedOut => "timed_out",
    }
}

/// Engine status plus the process's self-reported state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDescription {
    pub status: ProcessStatus,
    pub run_id: RunId,
    pub state: WorkflowState,
}

/// Adapter for the external durable-workflow engine
#[async_trait]
pub trait WorkflowEngine: Clone + Send + Sync + 'static {
    /// Start a new process; fails with `AlreadyStarted` if one is running.
    async fn start_process(&self, name: &str, input: ProcessInput) -> Result<(), EngineError>;

    /// Deliver a signal to a running process.
    async fn signal(&self, name: &str, signal: ProcessSignal) -> Result<(), EngineError>;

    /// Start the process if it is not running and deliver the signal, as one request.
    async fn signal_with_start(
        &self,
        name: &str,
        input: ProcessInput,
        signal: ProcessSignal,
    ) -> Result<(), EngineError>;

    async fn describe(&self, name: &str) -> Result<ProcessDescription, EngineError>;

    /// Force-stop a process.
    async fn terminate(&self, name: &str, reason: &str) -> Result<(), EngineError>;

    /// Ask the process which job it is driving.
    async fn query_job_info(&self, name: &str) -> Result<JobInformation, EngineError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{EngineError, ProcessDescription, ProcessStatus, WorkflowEngine};
    use async_trait::async_trait;
    use ferry_core::{JobInformation, ProcessInput, ProcessSignal, RunId, WorkflowState};
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    /// Recorded engine call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum EngineCall {
        Start { name: String },
        Signal { name: String, signal: ProcessSignal },
        SignalWithStart { name: String, signal: ProcessSignal },
        Describe { name: String },
        Terminate { name: String, reason: String },
        QueryJobInfo { name: String },
    }

    struct FakeProcess {
        status: ProcessStatus,
        run_id: RunId,
        state: WorkflowState,
        job_info: JobInformation,
        input: ProcessInput,
    }

    #[derive(Default)]
    struct FakeEngineState {
        processes: HashMap<String, FakeProcess>,
        calls: Vec<EngineCall>,
        unreachable: HashSet<String>,
        vanish_on_signal: HashSet<String>,
        transport_down: bool,
    }

    /// In-memory workflow engine for testing
    #[derive(Clone, Default)]
    pub struct FakeWorkflowEngine {
        inner: Arc<Mutex<FakeEngineState>>,
    }

    impl FakeWorkflowEngine {
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<EngineCall> {
            self.inner.lock().calls.clone()
        }

        pub fn clear_calls(&self) {
            self.inner.lock().calls.clear();
        }

        /// Seed a process with the given status and self-reported state.
        pub fn set_process(&self, name: &str, status: ProcessStatus, state: WorkflowState) {
            let mut inner = self.inner.lock();
            let scope = name.strip_prefix(ferry_core::PROCESS_NAME_PREFIX).unwrap_or(name);
            inner.processes.insert(
                name.to_string(),
                FakeProcess {
                    status,
                    run_id: RunId::new(),
                    state,
                    job_info: JobInformation::non_running(),
                    input: ProcessInput::initial(scope),
                },
            );
        }

        pub fn set_job_info(&self, name: &str, info: JobInformation) {
            if let Some(process) = self.inner.lock().processes.get_mut(name) {
                process.job_info = info;
            }
        }

        /// Make `describe` and `query_job_info` fail for `name` until it is restarted.
        pub fn make_unreachable(&self, name: &str) {
            self.inner.lock().unreachable.insert(name.to_string());
        }

        /// Make the next `signal` to `name` fail with `NotFound` while
        /// `describe` still reports the process running.
        pub fn vanish_on_next_signal(&self, name: &str) {
            self.inner.lock().vanish_on_signal.insert(name.to_string());
        }

        /// Make every call fail with a transport error.
        pub fn set_transport_down(&self, down: bool) {
            self.inner.lock().transport_down = down;
        }

        pub fn status(&self, name: &str) -> Option<ProcessStatus> {
            self.inner.lock().processes.get(name).map(|p| p.status)
        }

        pub fn state(&self, name: &str) -> Option<WorkflowState> {
            self.inner.lock().processes.get(name).map(|p| p.state.clone())
        }

        pub fn input(&self, name: &str) -> Option<ProcessInput> {
            self.inner.lock().processes.get(name).map(|p| p.input.clone())
        }

        /// Record the call; fail if the transport is down.
        fn record(&self, call: EngineCall) -> Result<(), EngineError> {
            let mut inner = self.inner.lock();
            inner.calls.push(call);
            if inner.transport_down {
                return Err(EngineError::Transport("connection refused".to_string()));
            }
            Ok(())
        }

        fn launch(state: &mut FakeEngineState, name: &str, input: ProcessInput) {
            state.unreachable.remove(name);
            state.processes.insert(
                name.to_string(),
                FakeProcess {
                    status: ProcessStatus::Running,
                    run_id: RunId::new(),
                    state: input.state.clone().unwrap_or_default(),
                    job_info: JobInformation::non_running(),
                    input,
                },
            );
        }
    }

    #[async_trait]
    impl WorkflowEngine for FakeWorkflowEngine {
        async fn start_process(&self, name: &str, input: ProcessInput) -> Result<(), EngineError> {
            self.record(EngineCall::Start { name: name.to_string() })?;
            let mut inner = self.inner.lock();
            if inner.processes.get(name).is_some_and(|p| !p.status.is_closed()) {
                return Err(EngineError::AlreadyStarted(name.to_string()));
            }
            Self::launch(&mut inner, name, input);
            Ok(())
        }

        async fn signal(&self, name: &str, signal: ProcessSignal) -> Result<(), EngineError> {
            self.record(EngineCall::Signal { name: name.to_string(), signal: signal.clone() })?;
            let mut inner = self.inner.lock();
            if inner.vanish_on_signal.remove(name) {
                return Err(EngineError::NotFound(name.to_string()));
            }
            match inner.processes.get_mut(name) {
                Some(process) if !process.status.is_closed() => {
                    process.state.apply(&signal);
                    Ok(())
                }
                _ => Err(EngineError::NotFound(name.to_string())),
            }
        }

        async fn signal_with_start(
            &self,
            name: &str,
            input: ProcessInput,
            signal: ProcessSignal,
        ) -> Result<(), EngineError> {
            self.record(EngineCall::SignalWithStart {
                name: name.to_string(),
                signal: signal.clone(),
            })?;
            let mut inner = self.inner.lock();
            if !inner.processes.get(name).is_some_and(|p| !p.status.is_closed()) {
                Self::launch(&mut inner, name, input);
            }
            if let Some(process) = inner.processes.get_mut(name) {
                process.state.apply(&signal);
            }
            Ok(())
        }

        async fn describe(&self, name: &str) -> Result<ProcessDescription, EngineError> {
            self.record(EngineCall::Describe { name: name.to_string() })?;
            let inner = self.inner.lock();
            if inner.unreachable.contains(name) {
                return Err(EngineError::Transport(format!("{name} unreachable")));
            }
            inner
                .processes
                .get(name)
                .map(|p| ProcessDescription {
                    status: p.status,
                    run_id: p.run_id.clone(),
                    state: p.state.clone(),
                })
                .ok_or_else(|| EngineError::NotFound(name.to_string()))
        }

        async fn terminate(&self, name: &str, reason: &str) -> Result<(), EngineError> {
            self.record(EngineCall::Terminate {
                name: name.to_string(),
                reason: reason.to_string(),
            })?;
            let mut inner = self.inner.lock();
            match inner.processes.get_mut(name) {
                Some(process) if !process.status.is_closed() => {
                    process.status = ProcessStatus::Terminated;
                    Ok(())
                }
                _ => Err(EngineError::NotFound(name.to_string())),
            }
        }

        async fn query_job_info(&self, name: &str) -> Result<JobInformation, EngineError> {
            self.record(EngineCall::QueryJobInfo { name: name.to_string() })?;
            let inner = self.inner.lock();
            if inner.unreachable.contains(name) {
                return Err(EngineError::Transport(format!("{name} unreachable")));
            }
            inner
                .processes
                .get(name)
                .map(|p| p.job_info)
                .ok_or_else(|| EngineError::NotFound(name.to_string()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{EngineCall, FakeWorkflowEngine};

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
