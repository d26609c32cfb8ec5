// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job event handlers.

use ferry_core::{Job, JobStatus, LedgerEvent};

use super::LedgerState;

pub(crate) fn apply(state: &mut LedgerState, event: &LedgerEvent) {
    match event {
        LedgerEvent::JobEnqueued { id, scope, config_type, config, at_ms } => {
            state.last_job_id = state.last_job_id.max(id.get());
            state.jobs.entry(*id).or_insert_with(|| Job {
                id: *id,
                scope: scope.clone(),
                config_type: *config_type,
                config: config.clone(),
                status: JobStatus::Pending,
                attempts: Vec::new(),
                created_at_ms: *at_ms,
                updated_at_ms: *at_ms,
                started_at_ms: None,
            });
        }

        LedgerEvent::JobStatusChanged { id, status, at_ms } => {
            if let Some(job) = state.jobs.get_mut(id) {
                // Terminal jobs are never overwritten
                if job.is_terminal() || job.status == *status {
                    return;
                }
                job.status = *status;
                job.updated_at_ms = *at_ms;
            }
        }

        LedgerEvent::JobsPurged { ids } => {
            for id in ids {
                state.jobs.remove(id);
            }
        }

        _ => {}
    }
}
