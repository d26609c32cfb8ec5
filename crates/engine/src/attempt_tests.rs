// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ferry_adapters::FakeHeartbeat;
use ferry_core::{ConfigType, FakeClock};
use std::sync::atomic::AtomicUsize;
use tempfile::{tempdir, TempDir};

#[derive(Clone, Copy)]
enum Mode {
    Double,
    /// Spin until stopped, then report success anyway
    UntilStopped,
    SleepThenDouble(Duration),
    Fail,
    Panic,
}

#[derive(Clone)]
struct TestWorker {
    mode: Mode,
    runs: Arc<AtomicUsize>,
    cancels: Arc<AtomicUsize>,
}

impl TestWorker {
    fn new(mode: Mode) -> Self {
        Self { mode, runs: Arc::default(), cancels: Arc::default() }
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl Worker<u32, u32> for TestWorker {
    fn run(&self, input: u32, ctx: &WorkerContext) -> Result<u32, WorkerError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Mode::Double => Ok(input * 2),
            Mode::UntilStopped => {
                while !ctx.is_stopped() {
                    std::thread::sleep(Duration::from_millis(2));
                }
                Ok(input)
            }
            Mode::SleepThenDouble(d) => {
                std::thread::sleep(d);
                Ok(input * 2)
            }
            Mode::Fail => Err(WorkerError::Failed("source exited 1".to_string())),
            Mode::Panic => panic!("worker blew up"),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    dir: TempDir,
    ledger: Arc<JobLedger<FakeClock>>,
}

impl Fixture {
    fn new() -> Self {
        Self { dir: tempdir().unwrap(), ledger: Arc::new(JobLedger::in_memory(FakeClock::new())) }
    }

    fn runner(&self, heartbeat: FakeHeartbeat) -> AttemptRunner<FakeHeartbeat, FakeClock> {
        let config = AttemptRunnerConfig::new(self.dir.path())
            .heartbeat_interval(Duration::from_millis(10));
        AttemptRunner::new(Arc::clone(&self.ledger), heartbeat, config)
    }

    fn running_attempt(&self) -> AttemptTarget {
        let id =
            self.ledger.enqueue("c1", ConfigType::Sync, serde_json::Value::Null).unwrap().unwrap();
        let n = self.ledger.create_attempt(id, Path::new("/logs/1/0/logs.log")).unwrap();
        AttemptTarget::ledger(id, n, "sync_1").processing_queue("SYNC")
    }
}

#[tokio::test]
async fn completed_attempt_records_workflow_info_and_logs() {
    let fx = Fixture::new();
    let target = fx.running_attempt();
    let worker = TestWorker::new(Mode::Double);

    let outcome =
        fx.runner(FakeHeartbeat::new()).run(&target, || Ok(worker.clone()), || Ok(21)).await;

    assert_eq!(outcome.completed(), Some(42));
    let job = fx.ledger.get_job(JobId(1)).unwrap();
    let attempt = job.attempt(0).unwrap();
    assert_eq!(attempt.workflow_id.as_deref(), Some("sync_1"));
    assert_eq!(attempt.processing_queue.as_deref(), Some("SYNC"));

    let root = fx.dir.path().join("1/0");
    assert!(root.is_dir());
    let log = std::fs::read_to_string(root.join("logs.log")).unwrap();
    assert!(log.contains("starting attempt 0 (workflow sync_1)"));
    assert!(log.contains("attempt completed"));
}

#[tokio::test]
async fn pre_start_cancellation_never_runs_work() {
    let fx = Fixture::new();
    let target = fx.running_attempt();
    let worker = TestWorker::new(Mode::Double);
    let heartbeat = FakeHeartbeat::cancelled();

    let outcome = fx.runner(heartbeat.clone()).run(&target, || Ok(worker.clone()), || Ok(1)).await;

    assert!(outcome.is_cancelled());
    assert_eq!(worker.runs(), 0);
    assert_eq!(worker.cancels(), 1);
    assert_eq!(heartbeat.beats(), 1);
}

#[tokio::test]
async fn mid_run_cancellation_wins_over_late_success() {
    let fx = Fixture::new();
    let target = fx.running_attempt();
    let worker = TestWorker::new(Mode::UntilStopped);

    // One pre-start beat and one periodic beat succeed, then cancel
    let outcome =
        fx.runner(FakeHeartbeat::cancel_after(2))
            .run(&target, || Ok(worker.clone()), || Ok(5))
            .await;

    assert!(outcome.is_cancelled());
    assert_eq!(worker.runs(), 1);
    assert_eq!(worker.cancels(), 1);
}

#[tokio::test]
async fn non_cancellation_heartbeat_errors_are_ignored() {
    let fx = Fixture::new();
    let target = fx.running_attempt();
    let worker = TestWorker::new(Mode::SleepThenDouble(Duration::from_millis(60)));
    let heartbeat = FakeHeartbeat::new();
    heartbeat.push(Err(HeartbeatError::AlreadyCompleted));
    heartbeat.push(Err(HeartbeatError::TimedOut("no response".to_string())));

    let outcome = fx.runner(heartbeat.clone()).run(&target, || Ok(worker.clone()), || Ok(4)).await;

    assert_eq!(outcome.completed(), Some(8));
    assert_eq!(worker.cancels(), 0);
    assert!(heartbeat.beats() >= 2);
}

#[tokio::test]
async fn worker_error_fails_attempt() {
    let fx = Fixture::new();
    let target = fx.running_attempt();

    let outcome = fx
        .runner(FakeHeartbeat::new())
        .run(&target, || Ok(TestWorker::new(Mode::Fail)), || Ok(1))
        .await;

    assert!(matches!(
        outcome,
        AttemptOutcome::Failed(WorkerError::Failed(msg)) if msg == "source exited 1"
    ));
}

#[tokio::test]
async fn worker_panic_fails_attempt() {
    let fx = Fixture::new();
    let target = fx.running_attempt();

    let outcome = fx
        .runner(FakeHeartbeat::new())
        .run(&target, || Ok(TestWorker::new(Mode::Panic)), || Ok(1))
        .await;

    assert!(matches!(outcome, AttemptOutcome::Failed(WorkerError::Panicked(_))));
}

#[tokio::test]
async fn input_supplier_error_fails_without_running() {
    let fx = Fixture::new();
    let target = fx.running_attempt();
    let worker = TestWorker::new(Mode::Double);

    let outcome = fx
        .runner(FakeHeartbeat::new())
        .run(
            &target,
            || Ok(worker.clone()),
            || Err(WorkerError::Input("config missing".to_string())),
        )
        .await;

    assert!(matches!(outcome, AttemptOutcome::Failed(WorkerError::Input(_))));
    assert_eq!(worker.runs(), 0);
}

#[tokio::test]
async fn synchronous_target_skips_ledger() {
    let fx = Fixture::new();
    let target = AttemptTarget::synchronous("check_connection_abc");
    assert_eq!(target.attempt_number, 0);
    assert!(JobId::parse(&target.job_id).is_none());

    let outcome = fx
        .runner(FakeHeartbeat::new())
        .run(&target, || Ok(TestWorker::new(Mode::Double)), || Ok(3))
        .await;

    assert_eq!(outcome.completed(), Some(6));
    assert!(fx.ledger.state().jobs.is_empty());
    assert!(fx.dir.path().join(&target.job_id).join("0").is_dir());
}

#[tokio::test]
async fn numeric_job_without_attempt_fails_setup() {
    let fx = Fixture::new();
    let worker = TestWorker::new(Mode::Double);
    let target = AttemptTarget::ledger(JobId(99), 0, "sync_99");

    let outcome =
        fx.runner(FakeHeartbeat::new()).run(&target, || Ok(worker.clone()), || Ok(1)).await;

    assert!(matches!(outcome, AttemptOutcome::Failed(WorkerError::Ledger(_))));
    assert_eq!(worker.runs(), 0);
}

#[test]
fn teardown_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let stop = CancellationToken::new();
    let teardown = Teardown {
        done: AtomicBool::new(false),
        cancel_hook: {
            let calls = Arc::clone(&calls);
            Box::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        },
        stop: stop.clone(),
    };

    teardown.run();
    teardown.run();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(stop.is_cancelled());
}
