//! Opt-in retry and polling loops for callers of the queue client.
//!
//! Nothing on the send or resolve paths retries by itself; callers that want
//! to ride out transient transport or store failures wrap those calls here.

use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::debug;

use crate::errors::ExtendedError;

/// Backoff for [`with_retry`]. Delays grow as `base_delay_ms ^ attempt`
/// milliseconds, capped at `max_delay`, with jitter applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay_ms: u64,
    pub max_delay: Duration,
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 10,
            max_delay: Duration::from_secs(5),
            max_retries: 5,
        }
    }
}

/// Runs `operation`, retrying transport and store failures only. Encoding,
/// decoding and configuration errors are returned at once.
///
/// # Errors
///
/// Returns the last error once retries are exhausted.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<T, ExtendedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ExtendedError>>,
{
    let strategy = ExponentialBackoff::from_millis(policy.base_delay_ms)
        .max_delay(policy.max_delay)
        .map(jitter)
        .take(policy.max_retries);

    RetryIf::start(strategy, operation, ExtendedError::is_remote).await
}

/// Result of one attempt in [`poll_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState<T> {
    Ready(T),
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

/// Calls `check` until it reports [`PollState::Ready`], doubling the pause
/// between attempts up to `max_delay`.
///
/// # Errors
///
/// Returns the first error `check` raises, or a `TimeoutError` once
/// `max_attempts` checks have come back pending.
pub async fn poll_until<F, Fut, T>(policy: &PollPolicy, mut check: F) -> Result<T, ExtendedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollState<T>, ExtendedError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;

    for attempt in 1..=attempts {
        if let PollState::Ready(value) = check().await? {
            return Ok(value);
        }
        if attempt < attempts {
            debug!(attempt, delay_ms = delay.as_millis(), "Still pending, backing off");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(policy.max_delay);
        }
    }

    Err(ExtendedError::TimeoutError(format!(
        "still pending after {attempts} attempts"
    )))
}
