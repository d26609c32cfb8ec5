// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job history retention.

use crate::state::LedgerState;
use ferry_core::clock::MS_PER_DAY;
use ferry_core::{Job, JobId};
use std::collections::BTreeMap;

/// How much job history to keep per scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Jobs younger than this are kept unless the scope has too many
    pub minimum_age_days: u64,
    /// Jobs positioned beyond this count (newest first) are purged regardless of age
    pub excessive_number_of_jobs: usize,
    /// The newest jobs that are always kept
    pub minimum_recency: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { minimum_age_days: 30, excessive_number_of_jobs: 500, minimum_recency: 10 }
    }
}

impl RetentionPolicy {
    ferry_core::setters! {
        set {
            minimum_age_days: u64,
            excessive_number_of_jobs: usize,
            minimum_recency: usize,
        }
    }

    /// Select the jobs to purge as of `now_ms`, in ascending id order.
    pub fn select(&self, state: &LedgerState, now_ms: u64) -> Vec<JobId> {
        let cutoff_ms = now_ms.saturating_sub(self.minimum_age_days.saturating_mul(MS_PER_DAY));

        let mut by_scope: BTreeMap<&str, Vec<&Job>> = BTreeMap::new();
        for job in state.jobs.values() {
            by_scope.entry(job.scope.as_str()).or_default().push(job);
        }

        let mut purged = Vec::new();
        for jobs in by_scope.values_mut() {
            jobs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(b.id.cmp(&a.id)));
            for (position, job) in jobs.iter().enumerate() {
                if position < self.minimum_recency || !job.is_terminal() {
                    continue;
                }
                let too_old = job.created_at_ms < cutoff_ms;
                let too_many = position >= self.excessive_number_of_jobs;
                if too_old || too_many {
                    purged.push(job.id);
                }
            }
        }
        purged.sort();
        purged
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
