// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable ledger specs: history survives restarts and admission stays
//! single-flight under contention.

use crate::prelude::*;

#[test]
fn job_history_survives_checkpoint_and_restart() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();

    let before = {
        let ledger = durable_ledger(dir.path(), clock.clone());
        let config = serde_json::json!({"streams": 2});
        let id = ledger.enqueue("c1", ConfigType::Sync, config).unwrap().unwrap();
        let first = ledger.create_attempt(id, Path::new("/w/1/0/logs.log")).unwrap();
        ledger.fail_attempt(id, first).unwrap();
        ledger.checkpoint().unwrap();

        clock.advance(Duration::from_secs(30));
        let second = ledger.create_attempt(id, Path::new("/w/1/1/logs.log")).unwrap();
        ledger.write_attempt_output(id, second, serde_json::json!({"records": 10})).unwrap();
        ledger.succeed_attempt(id, second).unwrap();
        ledger.state()
    };

    let ledger = durable_ledger(dir.path(), clock);
    similar_asserts::assert_eq!(ledger.state(), before);

    let job = ledger.get_job(JobId(1)).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.attempts_count(), 2);
    assert_eq!(job.attempt(0).unwrap().status, AttemptStatus::Failed);
    assert_eq!(ledger.enqueue("c1", ConfigType::Sync, null()).unwrap(), Some(JobId(2)));
}

#[test]
fn concurrent_enqueue_admits_one_replication_job_per_scope() {
    let dir = tempdir().unwrap();
    let ledger = durable_ledger(dir.path(), FakeClock::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            let config_type =
                if i % 2 == 0 { ConfigType::Sync } else { ConfigType::ResetConnection };
            std::thread::spawn(move || ledger.enqueue("c1", config_type, null()).unwrap())
        })
        .collect();
    let admitted = handles.into_iter().filter_map(|h| h.join().unwrap()).count();

    assert_eq!(admitted, 1);
    drop(ledger);
    let reopened = durable_ledger(dir.path(), FakeClock::new());
    assert_eq!(reopened.state().jobs.len(), 1);
}

#[test]
fn stale_writer_cannot_resurrect_cancelled_job() {
    let ledger = JobLedger::in_memory(FakeClock::new());
    let id = ledger.enqueue("c1", ConfigType::Sync, null()).unwrap().unwrap();
    let n = ledger.create_attempt(id, Path::new("/w/1/0/logs.log")).unwrap();

    ledger.cancel_job(id).unwrap();
    ledger.fail_attempt(id, n).unwrap();
    ledger.succeed_attempt(id, n).unwrap();
    ledger.reset_job(id).unwrap();

    let job = ledger.get_job(id).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.attempt(n).unwrap().status, AttemptStatus::Failed);
    assert!(matches!(
        ledger.create_attempt(id, Path::new("/w/1/1/logs.log")),
        Err(LedgerError::InvariantViolation(_))
    ));
}

#[test]
fn next_job_waits_for_busy_scope() {
    let ledger = JobLedger::in_memory(FakeClock::new());
    let busy = ledger.enqueue("c1", ConfigType::Sync, null()).unwrap().unwrap();
    ledger.create_attempt(busy, Path::new("/w/1/0/logs.log")).unwrap();
    ledger.enqueue("c1", ConfigType::DiscoverSchema, null()).unwrap().unwrap();
    let free = ledger.enqueue("c2", ConfigType::Sync, null()).unwrap().unwrap();

    assert_eq!(ledger.get_next_job().map(|j| j.id), Some(free));
}
