//! Deadline-bounded polling for worker results.

use std::future::Future;
use std::time::Duration;

use parley_types::RequestId;
use tokio::time::{sleep_until, timeout_at, Instant};

use crate::error::ReadError;

/// Something the poller can ask "is the result for this identifier ready?".
///
/// `Ok(None)` means "not yet". Implementations must not block the runtime;
/// blocking store reads belong on `spawn_blocking`.
pub trait ResultSource {
    /// The value produced once the result is ready.
    type Output: Send;

    fn fetch(
        &self,
        request_id: &RequestId,
    ) -> impl Future<Output = Result<Option<Self::Output>, ReadError>> + Send;
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// A result was observed.
    Ready { value: T, attempts: u32 },
    /// The deadline passed without a result.
    TimedOut { attempts: u32 },
    /// The cancellation signal fired first.
    Cancelled { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts, .. }
            | Self::TimedOut { attempts }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            Self::TimedOut { .. } | Self::Cancelled { .. } => None,
        }
    }
}

/// Repeatedly reads a [`ResultSource`] at a fixed interval until a result
/// appears or a deadline passes.
///
/// Failed attempts are logged and treated as "no result yet". No attempt runs
/// past the deadline, and the wait between attempts is a timer, so dropping
/// the returned future cancels the loop.
#[derive(Debug, Clone)]
pub struct Poller<S> {
    source: S,
    interval: Duration,
}

impl<S: ResultSource + Sync> Poller<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls until a result is observed or `deadline` passes.
    pub async fn poll(&self, request_id: &RequestId, deadline: Instant) -> PollOutcome<S::Output> {
        self.poll_until_cancelled(request_id, deadline, std::future::pending())
            .await
    }

    /// Like [`poll`](Self::poll), but also stops when `cancel` resolves.
    pub async fn poll_until_cancelled<C>(
        &self,
        request_id: &RequestId,
        deadline: Instant,
        cancel: C,
    ) -> PollOutcome<S::Output>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        let mut attempts: u32 = 0;

        loop {
            if Instant::now() >= deadline {
                tracing::info!(request_id = %request_id, attempts, "poll deadline reached");
                return PollOutcome::TimedOut { attempts };
            }

            attempts += 1;
            let attempt = timeout_at(deadline, self.source.fetch(request_id));
            let result = tokio::select! {
                biased;
                () = &mut cancel => {
                    tracing::info!(request_id = %request_id, attempts, "poll cancelled");
                    return PollOutcome::Cancelled { attempts };
                }
                result = attempt => result,
            };

            match result {
                Ok(Ok(Some(value))) => {
                    tracing::info!(request_id = %request_id, attempts, "result observed");
                    return PollOutcome::Ready { value, attempts };
                }
                Ok(Ok(None)) => {
                    tracing::debug!(request_id = %request_id, attempts, "result not ready");
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        request_id = %request_id,
                        attempts,
                        error = %e,
                        "poll attempt failed, will retry"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        request_id = %request_id,
                        attempts,
                        "poll attempt still running at deadline"
                    );
                }
            }

            let next = (Instant::now() + self.interval).min(deadline);
            tokio::select! {
                biased;
                () = &mut cancel => {
                    tracing::info!(request_id = %request_id, attempts, "poll cancelled");
                    return PollOutcome::Cancelled { attempts };
                }
                () = sleep_until(next) => {}
            }
        }
    }
}
