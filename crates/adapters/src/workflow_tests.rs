// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ferry_core::{process_name, JobId, RunId};
use yare::parameterized;

#[parameterized(
    running = { ProcessStatus::Running, false },
    completed = { ProcessStatus::Completed, true },
    terminated = { ProcessStatus::Terminated, true },
    timed_out = { ProcessStatus::TimedOut, true },
)]
fn closed_statuses(status: ProcessStatus, closed: bool) {
    assert_eq!(status.is_closed(), closed);
}

#[tokio::test]
async fn fake_start_then_signal_applies_to_state() {
    let engine = FakeWorkflowEngine::new();
    let name = process_name("c1");
    engine.start_process(&name, ProcessInput::initial("c1")).await.unwrap();
    engine.signal(&name, ProcessSignal::ConnectionUpdated).await.unwrap();

    let description = engine.describe(&name).await.unwrap();
    assert_eq!(description.status, ProcessStatus::Running);
    assert!(description.state.updated);
}

#[tokio::test]
async fn fake_start_twice_is_already_started() {
    let engine = FakeWorkflowEngine::new();
    engine.start_process("p", ProcessInput::initial("p")).await.unwrap();
    let err = engine.start_process("p", ProcessInput::initial("p")).await.unwrap_err();
    assert_eq!(err, EngineError::AlreadyStarted("p".to_string()));
}

#[tokio::test]
async fn fake_signal_to_missing_process_is_not_found() {
    let engine = FakeWorkflowEngine::new();
    let err = engine.signal("p", ProcessSignal::CancelJob).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn fake_signal_with_start_replaces_terminated_process() {
    let engine = FakeWorkflowEngine::new();
    engine.set_process("p", ProcessStatus::Running, WorkflowState::default());
    let first_run = engine.describe("p").await.unwrap().run_id;
    engine.make_unreachable("p");
    engine.terminate("p", "repair").await.unwrap();
    assert_eq!(engine.status("p"), Some(ProcessStatus::Terminated));

    engine
        .signal_with_start("p", ProcessInput::initial("p"), ProcessSignal::SubmitManualSync)
        .await
        .unwrap();

    let described = engine.describe("p").await.unwrap();
    assert_eq!(engine.status("p"), Some(ProcessStatus::Running));
    assert!(described.state.skip_scheduling);
    assert_ne!(described.run_id, first_run);
    assert!(described.run_id.as_str().starts_with(RunId::PREFIX));
}

#[tokio::test]
async fn fake_records_calls_and_job_info() {
    let engine = FakeWorkflowEngine::new();
    engine.set_process("p", ProcessStatus::Running, WorkflowState::default());
    engine.set_job_info("p", JobInformation { job_id: JobId(12), attempt_number: Some(0) });

    let info = engine.query_job_info("p").await.unwrap();
    assert_eq!(info.job_id, JobId(12));
    assert_eq!(engine.calls(), vec![EngineCall::QueryJobInfo { name: "p".to_string() }]);
}

#[tokio::test]
async fn fake_transport_down_fails_every_call() {
    let engine = FakeWorkflowEngine::new();
    engine.set_transport_down(true);
    assert!(matches!(
        engine.start_process("p", ProcessInput::initial("p")).await,
        Err(EngineError::Transport(_))
    ));
    assert_eq!(engine.calls().len(), 1);
}
