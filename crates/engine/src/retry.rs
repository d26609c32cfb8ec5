// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequential retry loop over attempts, chaining each output into the next
//! attempt's input.

use crate::attempt::AttemptOutcome;
use crate::error::WorkerError;
use std::future::Future;

/// Why a retry loop ended before the predicate or the limit stopped it.
#[derive(Debug)]
pub enum StopReason {
    Cancelled,
    Failed(WorkerError),
}

#[derive(Debug)]
pub struct RetryOutcome<O> {
    /// Outputs of every completed attempt, in order
    pub outputs: Vec<O>,
    pub stopped: Option<StopReason>,
}

impl<O> RetryOutcome<O> {
    pub fn last_output(&self) -> Option<&O> {
        self.outputs.last()
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(self.stopped, Some(StopReason::Cancelled))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryCoordinator {
    max_retries: u32,
}

impl RetryCoordinator {
    /// `max_retries` caps the total number of attempts; at least one always runs.
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries: max_retries.max(1) }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run attempts until `should_retry` rejects an output, the limit is
    /// reached, or an attempt does not complete.
    ///
    /// `attempt` receives the zero-based retry index and that retry's input.
    pub async fn run<I, O, A, Fut, P, N>(
        &self,
        initial: I,
        mut attempt: A,
        should_retry: P,
        next_input: N,
    ) -> RetryOutcome<O>
    where
        I: Clone,
        A: FnMut(u32, I) -> Fut,
        Fut: Future<Output = AttemptOutcome<O>>,
        P: Fn(&O) -> bool,
        N: Fn(&I, &O) -> I,
    {
        let mut input = initial;
        let mut outputs = Vec::new();

        for index in 0..self.max_retries {
            let output = match attempt(index, input.clone()).await {
                AttemptOutcome::Completed(output) => output,
                AttemptOutcome::Cancelled => {
                    tracing::info!(retry = index, "retry loop stopped: attempt cancelled");
                    return RetryOutcome { outputs, stopped: Some(StopReason::Cancelled) };
                }
                AttemptOutcome::Failed(e) => {
                    tracing::warn!(retry = index, error = %e, "retry loop stopped: attempt failed");
                    return RetryOutcome { outputs, stopped: Some(StopReason::Failed(e)) };
                }
            };

            let last = index + 1 == self.max_retries;
            let retry = !last && should_retry(&output);
            if retry {
                input = next_input(&input, &output);
            }
            outputs.push(output);
            if !retry {
                break;
            }
            tracing::debug!(retry = index + 1, max_retries = self.max_retries, "retrying attempt");
        }

        RetryOutcome { outputs, stopped: None }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
