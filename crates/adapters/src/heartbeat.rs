// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat sources: the channel through which a running attempt learns it
//! has been cancelled externally.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeartbeatError {
    /// The execution was cancelled externally; the attempt must stop.
    #[error("execution cancelled")]
    Cancelled,
    /// The engine already considers the execution finished.
    #[error("execution already completed")]
    AlreadyCompleted,
    #[error("heartbeat timed out: {0}")]
    TimedOut(String),
    #[error("heartbeat transport error: {0}")]
    Transport(String),
}

impl HeartbeatError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, HeartbeatError::Cancelled)
    }
}

/// Adapter polled on a fixed interval while an attempt runs
#[async_trait]
pub trait HeartbeatSource: Clone + Send + Sync + 'static {
    /// Report liveness; `Err(Cancelled)` means the attempt must stop.
    async fn heartbeat(&self) -> Result<(), HeartbeatError>;
}

/// Heartbeat backed by a local cancellation token.
///
/// Used by the daemon for attempts it supervises directly: cancelling the
/// token makes the next heartbeat report cancellation.
#[derive(Clone, Debug, Default)]
pub struct TokenHeartbeat {
    token: CancellationToken,
}

impl TokenHeartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[async_trait]
impl HeartbeatSource for TokenHeartbeat {
    async fn heartbeat(&self) -> Result<(), HeartbeatError> {
        if self.token.is_cancelled() {
            return Err(HeartbeatError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{HeartbeatError, HeartbeatSource};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeHeartbeatState {
        beats: usize,
        /// Scripted responses, consumed one per heartbeat
        script: VecDeque<Result<(), HeartbeatError>>,
        /// Response once the script is exhausted
        fallback: Option<HeartbeatError>,
    }

    /// Scripted heartbeat source for testing
    #[derive(Clone, Default)]
    pub struct FakeHeartbeat {
        inner: Arc<Mutex<FakeHeartbeatState>>,
    }

    impl FakeHeartbeat {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every heartbeat reports cancellation.
        pub fn cancelled() -> Self {
            let fake = Self::new();
            fake.cancel();
            fake
        }

        /// Beat `n` times successfully, then report cancellation.
        pub fn cancel_after(n: usize) -> Self {
            let fake = Self::new();
            {
                let mut inner = fake.inner.lock();
                inner.script.extend((0..n).map(|_| Ok(())));
                inner.fallback = Some(HeartbeatError::Cancelled);
            }
            fake
        }

        /// From now on, every heartbeat reports cancellation.
        pub fn cancel(&self) {
            let mut inner = self.inner.lock();
            inner.script.clear();
            inner.fallback = Some(HeartbeatError::Cancelled);
        }

        /// Queue one response.
        pub fn push(&self, response: Result<(), HeartbeatError>) {
            self.inner.lock().script.push_back(response);
        }

        /// Number of heartbeats received
        pub fn beats(&self) -> usize {
            self.inner.lock().beats
        }
    }

    #[async_trait]
    impl HeartbeatSource for FakeHeartbeat {
        async fn heartbeat(&self) -> Result<(), HeartbeatError> {
            let mut inner = self.inner.lock();
            inner.beats += 1;
            match inner.script.pop_front() {
                Some(response) => response,
                None => inner.fallback.clone().map_or(Ok(()), Err),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHeartbeat;

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
