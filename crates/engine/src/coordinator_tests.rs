// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ferry_adapters::{EngineCall, FakeWorkflowEngine};
use ferry_core::JobInformation;
use yare::parameterized;

const SCOPE: &str = "c1";

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(future)
}

fn name() -> String {
    process_name(SCOPE)
}

fn setup() -> (FakeWorkflowEngine, WorkflowCoordinator<FakeWorkflowEngine>) {
    let engine = FakeWorkflowEngine::new();
    (engine.clone(), WorkflowCoordinator::new(engine))
}

fn running(engine: &FakeWorkflowEngine, state: WorkflowState) {
    engine.set_process(&name(), ProcessStatus::Running, state);
}

fn count(calls: &[EngineCall], pred: fn(&EngineCall) -> bool) -> usize {
    calls.iter().filter(|c| pred(c)).count()
}

fn assert_repaired_once(engine: &FakeWorkflowEngine) {
    let calls = engine.calls();
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::Terminate { .. })), 1);
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::SignalWithStart { .. })), 1);
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::Signal { .. })), 0);
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::Start { .. })), 0);
    let terminate = calls.iter().position(|c| matches!(c, EngineCall::Terminate { .. }));
    let sws = calls.iter().position(|c| matches!(c, EngineCall::SignalWithStart { .. }));
    assert!(terminate < sws);
}

// ── lookup / repair ────────────────────────────────────────────────────────

#[tokio::test]
async fn healthy_process_is_signalled_directly() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState::default());

    let handle = coordinator.update(SCOPE).await.unwrap();

    assert!(!handle.repaired);
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::Describe { name: name() },
            EngineCall::Signal { name: name(), signal: ProcessSignal::ConnectionUpdated },
        ]
    );
    assert!(engine.state(&name()).unwrap().updated);
}

#[tokio::test]
async fn unreachable_process_is_terminated_then_signal_with_started() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState::default());
    engine.make_unreachable(&name());

    let handle = coordinator.update(SCOPE).await.unwrap();

    assert!(handle.repaired);
    assert_repaired_once(&engine);
    assert_eq!(engine.status(&name()), Some(ProcessStatus::Running));
    assert!(engine.state(&name()).unwrap().updated);
    let state = engine.state(&name()).unwrap();
    assert_eq!(coordinator.lookup(SCOPE).await, ProcessLookup::Healthy(state));
}

#[tokio::test]
async fn missing_process_is_repaired_despite_terminate_failure() {
    let (engine, coordinator) = setup();

    let handle = coordinator.retry_failed_activity(SCOPE).await.unwrap();

    assert!(handle.repaired);
    assert_repaired_once(&engine);
    assert_eq!(engine.input(&name()), Some(ProcessInput::initial(SCOPE)));
    assert!(engine.state(&name()).unwrap().retry_failed_activity);
}

#[tokio::test]
async fn process_vanishing_before_signal_is_repaired() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState::default());
    engine.vanish_on_next_signal(&name());

    let handle = coordinator.update(SCOPE).await.unwrap();

    assert!(handle.repaired);
    let calls = engine.calls();
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::Signal { .. })), 1);
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::Terminate { .. })), 1);
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::SignalWithStart { .. })), 1);
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::Start { .. })), 0);
    assert_eq!(engine.status(&name()), Some(ProcessStatus::Running));
    assert!(engine.state(&name()).unwrap().updated);
}

#[tokio::test]
async fn quarantined_process_is_repaired() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState { quarantined: true, ..Default::default() });

    let handle = coordinator.update(SCOPE).await.unwrap();

    assert!(handle.repaired);
    assert_repaired_once(&engine);
    assert!(!engine.state(&name()).unwrap().quarantined);
}

#[parameterized(
    terminated = { ProcessStatus::Terminated },
    failed = { ProcessStatus::Failed },
    timed_out = { ProcessStatus::TimedOut },
    cancelled = { ProcessStatus::Cancelled },
)]
fn abnormally_closed_process_is_repaired(status: ProcessStatus) {
    let (engine, coordinator) = setup();
    engine.set_process(&name(), status, WorkflowState::default());

    block_on(coordinator.update(SCOPE)).unwrap();

    let calls = engine.calls();
    assert_eq!(count(&calls, |c| matches!(c, EngineCall::SignalWithStart { .. })), 1);
    assert_eq!(engine.status(&name()), Some(ProcessStatus::Running));
}

#[parameterized(
    completed = { ProcessStatus::Completed },
    terminated = { ProcessStatus::Terminated },
)]
fn deleted_process_is_never_terminated_or_started(status: ProcessStatus) {
    let (engine, coordinator) = setup();
    engine.set_process(&name(), status, WorkflowState { deleted: true, ..Default::default() });

    let err = block_on(coordinator.update(SCOPE)).unwrap_err();

    assert!(matches!(err, CoordinatorError::Deleted { scope } if scope == SCOPE));
    assert_eq!(engine.calls(), vec![EngineCall::Describe { name: name() }]);
}

#[tokio::test]
async fn completed_without_deleted_flag_fails_loudly() {
    let (engine, coordinator) = setup();
    engine.set_process(&name(), ProcessStatus::Completed, WorkflowState::default());

    let err = coordinator.update(SCOPE).await.unwrap_err();

    assert!(matches!(
        err,
        CoordinatorError::CompletedUnexpectedly { status: ProcessStatus::Completed, .. }
    ));
    assert_eq!(engine.calls(), vec![EngineCall::Describe { name: name() }]);
}

#[tokio::test]
async fn repair_propagates_engine_failure() {
    let (engine, coordinator) = setup();
    engine.set_transport_down(true);

    let err = coordinator.update(SCOPE).await.unwrap_err();

    assert!(matches!(err, CoordinatorError::Engine(EngineError::Transport(_))));
    assert_eq!(count(&engine.calls(), |c| matches!(c, EngineCall::SignalWithStart { .. })), 1);
}

// ── operations ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn sync_now_is_refused_while_running() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState { running: true, ..Default::default() });

    let result = coordinator.sync_now(SCOPE).await.unwrap();

    assert_eq!(result, ManualOperationResult::failed("A sync is already running for: c1"));
    assert_eq!(count(&engine.calls(), |c| matches!(c, EngineCall::Signal { .. })), 0);
}

#[tokio::test]
async fn sync_now_reports_current_job() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState::default());
    engine.set_job_info(&name(), JobInformation { job_id: JobId(7), attempt_number: Some(0) });

    let result = coordinator.sync_now(SCOPE).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.job_id, Some(JobId(7)));
    assert!(engine.state(&name()).unwrap().skip_scheduling);
}

#[parameterized(
    sync_now = { 0 },
    cancel = { 1 },
    reset = { 2 },
)]
fn manual_operation_on_deleted_process_reports_reason(op: u8) {
    let (engine, coordinator) = setup();
    let deleted = WorkflowState { deleted: true, ..Default::default() };
    engine.set_process(&name(), ProcessStatus::Completed, deleted);

    let result = block_on(async {
        match op {
            0 => coordinator.sync_now(SCOPE).await,
            1 => coordinator.cancel(SCOPE).await,
            _ => coordinator.reset(SCOPE).await,
        }
    })
    .unwrap();

    assert_eq!(result, ManualOperationResult::failed("Connection c1 is deleted"));
}

#[tokio::test]
async fn cancel_and_reset_deliver_signals() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState { running: true, ..Default::default() });

    assert!(coordinator.cancel(SCOPE).await.unwrap().is_success());
    assert!(coordinator.reset(SCOPE).await.unwrap().is_success());

    let state = engine.state(&name()).unwrap();
    assert!(state.cancelled);
    assert!(state.reset_connection);
    assert!(state.cancelled_for_reset);
}

#[tokio::test]
async fn update_connector_version_records_version() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState::default());

    coordinator.update_connector_version(SCOPE, "0.4.1").await.unwrap();

    assert_eq!(engine.state(&name()).unwrap().connector_version.as_deref(), Some("0.4.1"));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (engine, coordinator) = setup();
    running(&engine, WorkflowState::default());

    coordinator.delete(SCOPE).await.unwrap();
    assert!(engine.state(&name()).unwrap().deleted);

    let deleted = WorkflowState { deleted: true, ..Default::default() };
    engine.set_process(&name(), ProcessStatus::Completed, deleted);
    coordinator.delete(SCOPE).await.unwrap();
}

#[tokio::test]
async fn start_tolerates_already_running_process() {
    let (engine, coordinator) = setup();

    coordinator.start(SCOPE).await.unwrap();
    coordinator.start(SCOPE).await.unwrap();

    assert_eq!(count(&engine.calls(), |c| matches!(c, EngineCall::Start { .. })), 2);
    assert_eq!(engine.status(&name()), Some(ProcessStatus::Running));
}

#[tokio::test]
async fn restart_recovers_completed_process() {
    let (engine, coordinator) = setup();
    engine.set_process(&name(), ProcessStatus::Completed, WorkflowState::default());

    let handle = coordinator.restart(SCOPE).await.unwrap();

    assert!(handle.repaired);
    assert_eq!(engine.status(&name()), Some(ProcessStatus::Running));
    assert!(coordinator.update(SCOPE).await.is_ok());
}

#[tokio::test]
async fn is_running_swallows_errors() {
    let (engine, coordinator) = setup();
    assert!(!coordinator.is_running(SCOPE).await);

    running(&engine, WorkflowState::default());
    assert!(coordinator.is_running(SCOPE).await);

    engine.set_transport_down(true);
    assert!(!coordinator.is_running(SCOPE).await);
}

#[tokio::test]
async fn current_job_id_defaults_to_non_running() {
    let (engine, coordinator) = setup();
    assert_eq!(coordinator.current_job_id(SCOPE).await, JobId::NON_RUNNING);

    running(&engine, WorkflowState::default());
    engine.set_job_info(&name(), JobInformation { job_id: JobId(3), attempt_number: None });
    assert_eq!(coordinator.current_job_id(SCOPE).await, JobId(3));
}
