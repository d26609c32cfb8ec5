// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination-process specs: a pipeline's process is created, survives
//! becoming unreachable, and stays retired once deleted.

use crate::prelude::*;

const SCOPE: &str = "warehouse-sync";

fn terminate_and_restart_calls(calls: &[EngineCall]) -> (usize, usize) {
    let terminates = calls.iter().filter(|c| matches!(c, EngineCall::Terminate { .. })).count();
    let restarts = calls
        .iter()
        .filter(|c| matches!(c, EngineCall::Start { .. } | EngineCall::SignalWithStart { .. }))
        .count();
    (terminates, restarts)
}

#[tokio::test]
async fn pipeline_process_lifecycle() {
    let engine = FakeWorkflowEngine::new();
    let coordinator = WorkflowCoordinator::new(engine.clone());
    let name = process_name(SCOPE);

    coordinator.start(SCOPE).await.unwrap();
    assert!(coordinator.is_running(SCOPE).await);

    // Engine loses track of the process: the next signal repairs it
    engine.make_unreachable(&name);
    engine.clear_calls();
    let result = coordinator.sync_now(SCOPE).await.unwrap();
    assert!(result.is_success());
    assert_eq!(terminate_and_restart_calls(&engine.calls()), (1, 1));
    assert!(engine.state(&name).unwrap().skip_scheduling);

    // The process retires itself after a delete signal
    coordinator.delete(SCOPE).await.unwrap();
    let mut state = engine.state(&name).unwrap();
    assert!(state.deleted);
    state.running = false;
    engine.set_process(&name, ProcessStatus::Completed, state);

    engine.clear_calls();
    let err = coordinator.update(SCOPE).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Deleted { .. }));
    let result = coordinator.sync_now(SCOPE).await.unwrap();
    assert!(!result.is_success());
    coordinator.delete(SCOPE).await.unwrap();
    assert_eq!(terminate_and_restart_calls(&engine.calls()), (0, 0));
    assert!(!coordinator.is_running(SCOPE).await);
}

#[tokio::test]
async fn completed_process_needs_explicit_restart() {
    let engine = FakeWorkflowEngine::new();
    let coordinator = WorkflowCoordinator::new(engine.clone());
    engine.set_process(&process_name(SCOPE), ProcessStatus::Completed, WorkflowState::default());

    assert!(matches!(
        coordinator.reset(SCOPE).await,
        Err(CoordinatorError::CompletedUnexpectedly { .. })
    ));

    coordinator.restart(SCOPE).await.unwrap();
    let result = coordinator.reset(SCOPE).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.job_id, Some(JobId::NON_RUNNING));
    assert!(engine.state(&process_name(SCOPE)).unwrap().reset_connection);
}
