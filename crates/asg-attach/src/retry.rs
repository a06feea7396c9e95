//! Deadline-bounded retries with exponential backoff and cancellation.
//!
//! Every mutating Auto Scaling call goes through [`retry_transient`]. Only
//! errors the caller-supplied predicate marks as transient are retried; the
//! rest return on first occurrence. Both the in-flight call and the sleep
//! between attempts race the deadline and the cancellation token.

use crate::defaults::{DEFAULT_INITIAL_RETRY_DELAY, DEFAULT_MAX_RETRY_DELAY};
use backon::{BackoffBuilder, ExponentialBuilder};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for a retried call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay after the first transient failure
    pub initial_delay: Duration,
    /// Maximum delay between attempts (cap for exponential growth)
    pub max_delay: Duration,
    /// Total budget, including the attempts themselves
    pub timeout: Duration,
}

impl RetryConfig {
    /// Default backoff with the given overall budget
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_RETRY_DELAY,
            max_delay: DEFAULT_MAX_RETRY_DELAY,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Why a retried call gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// The deadline passed, either while sleeping or during an attempt
    Timeout {
        elapsed: Duration,
        attempts: u32,
        /// Last transient error seen, if any attempt completed
        last: Option<E>,
    },
    /// The cancellation token fired
    Cancelled { attempts: u32 },
    /// A non-transient error, returned as-is
    Failed(E),
}

/// Run `call` until it succeeds, fails with a non-transient error, the
/// timeout elapses, or `cancel` fires.
///
/// Delays start at `initial_delay` and double up to `max_delay` without
/// jitter, so they never decrease. A delay that would overrun the deadline is
/// clamped to it.
pub async fn retry_transient<T, E, F, Fut, P>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    operation: &str,
    is_transient: P,
    mut call: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let start = Instant::now();
    let deadline = start + config.timeout;
    let mut attempts = 0u32;
    let mut last: Option<E> = None;

    let mut delays = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_max_times(usize::MAX)
        .build();

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled { attempts });
        }
        if Instant::now() >= deadline {
            return Err(RetryError::Timeout {
                elapsed: start.elapsed(),
                attempts,
                last,
            });
        }

        attempts += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled { attempts });
            }
            _ = tokio::time::sleep_until(deadline) => {
                return Err(RetryError::Timeout {
                    elapsed: start.elapsed(),
                    attempts,
                    last,
                });
            }
            result = call() => result,
        };

        match result {
            Ok(value) => {
                debug!(operation, attempts, "Call succeeded");
                return Ok(value);
            }
            Err(e) if is_transient(&e) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let delay = delays.next().unwrap_or(config.max_delay).min(remaining);
                warn!(
                    operation,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    error = %e,
                    "Transient error, retrying..."
                );
                last = Some(e);

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(RetryError::Cancelled { attempts });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => {
                debug!(operation, attempts, error = %e, "Non-retryable error");
                return Err(RetryError::Failed(e));
            }
        }
    }
}
