// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt pipeline specs: activities drive a job from creation to a
//! terminal status through real attempt runs.

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Copies `batch` records per run; done once `total` records are copied.
struct CopyWorker {
    batch: u64,
    total: u64,
}

impl Worker<u64, u64> for CopyWorker {
    fn run(&self, copied: u64, ctx: &WorkerContext) -> Result<u64, WorkerError> {
        std::fs::write(ctx.job_root.join("progress"), copied.to_string())?;
        Ok((copied + self.batch).min(self.total))
    }

    fn cancel(&self) {}
}

/// Blocks until stopped, counting cancel hooks.
struct StuckWorker {
    cancels: Arc<AtomicUsize>,
}

impl Worker<(), ()> for StuckWorker {
    fn run(&self, _: (), ctx: &WorkerContext) -> Result<(), WorkerError> {
        while !ctx.is_stopped() {
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

fn activities<H: HeartbeatSource>(
    dir: &TempDir,
    heartbeat: H,
) -> JobActivities<FakeClock, H> {
    let ledger = durable_ledger(&dir.path().join("ledger"), FakeClock::new());
    let config = ActivitiesConfig::new(dir.path().join("workspace"))
        .heartbeat_interval(Duration::from_millis(10))
        .max_sync_retries(5);
    JobActivities::new(ledger, heartbeat, config)
}

#[tokio::test]
async fn sync_job_runs_to_success() {
    let dir = tempdir().unwrap();
    let activities = activities(&dir, FakeHeartbeat::new());

    let job_id = activities.create_new_job("c1", ConfigType::Sync, null()).unwrap();
    let attempt = activities.create_new_attempt(job_id).unwrap();
    let outcome = activities
        .run_attempt_with_retries(
            job_id,
            attempt,
            "sync_c1",
            || Ok(CopyWorker { batch: 40, total: 100 }),
            0u64,
            |copied: &u64| *copied < 100,
            |_, copied: &u64| *copied,
        )
        .await
        .unwrap();
    assert_eq!(outcome.outputs, vec![40, 80, 100]);

    let output = serde_json::json!({"records_copied": outcome.outputs.last()});
    activities.job_success(job_id, attempt, output.clone()).unwrap();

    let job = activities.ledger().get_job(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.attempt(attempt).unwrap().output, Some(output));
    assert_eq!(job.attempt(attempt).unwrap().workflow_id.as_deref(), Some("sync_c1"));

    let root = dir.path().join(format!("workspace/{job_id}/{attempt}"));
    assert_eq!(std::fs::read_to_string(root.join("progress")).unwrap(), "80");
    assert!(std::fs::read_to_string(root.join("logs.log")).unwrap().contains("attempt completed"));
}

#[tokio::test]
async fn failed_attempt_is_retried_with_a_new_attempt() {
    let dir = tempdir().unwrap();
    let activities = activities(&dir, FakeHeartbeat::new());
    let job_id = activities.create_new_job("c1", ConfigType::Sync, null()).unwrap();

    let first = activities.create_new_attempt(job_id).unwrap();
    let reason = FailureReason::system("destination timed out", 1_000_000);
    let summary = AttemptFailureSummary::single(reason);
    activities.attempt_failure(job_id, first, None, summary).unwrap();
    assert_eq!(activities.ledger().get_job(job_id).unwrap().status, JobStatus::Incomplete);

    let second = activities.create_new_attempt(job_id).unwrap();
    activities.job_success(job_id, second, null()).unwrap();

    let job = activities.ledger().get_job(job_id).unwrap();
    assert_eq!((first, second), (0, 1));
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.attempt(first).unwrap().status, AttemptStatus::Failed);
}

#[tokio::test]
async fn external_cancellation_stops_running_attempt() {
    let dir = tempdir().unwrap();
    let heartbeat = TokenHeartbeat::new();
    let activities = activities(&dir, heartbeat.clone());
    let job_id = activities.create_new_job("c1", ConfigType::Sync, null()).unwrap();
    let attempt = activities.create_new_attempt(job_id).unwrap();
    let cancels = Arc::new(AtomicUsize::new(0));

    let canceller = {
        let heartbeat = heartbeat.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            heartbeat.cancel();
        })
    };
    let outcome = activities
        .run_attempt_with_retries(
            job_id,
            attempt,
            "sync_c1",
            || Ok(StuckWorker { cancels: Arc::clone(&cancels) }),
            (),
            |_: &()| true,
            |_, _| (),
        )
        .await
        .unwrap();
    canceller.await.unwrap();

    assert!(outcome.was_cancelled());
    assert_eq!(cancels.load(Ordering::SeqCst), 1);

    let reason = AttemptFailureSummary::single(FailureReason::manual_cancellation(1_000_000));
    activities.job_cancelled(job_id, attempt, reason).unwrap();
    let job = activities.ledger().get_job(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.attempt(attempt).unwrap().status, AttemptStatus::Failed);
}
