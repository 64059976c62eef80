//! Bounded retry with exponential backoff
//!
//! Every remote call the reconciler makes goes through [`retry`]. The policy is
//! an explicit value handed in by the caller; nothing here is process-wide.
//!
//! ## Behavior
//!
//! 1. Invoke the operation
//! 2. On success, return immediately
//! 3. On a permanent error (see [`Error::is_transient`]), return it unchanged
//! 4. On a transient error, wait the current delay, double it, go to 1
//! 5. After `attempts` invocations, return [`Error::RetriesExhausted`]
//!
//! A [`CancellationToken`] aborts both the backoff wait and the in-flight call.
//!
//! Operations handed to the executor must tolerate being repeated. Record
//! creation is the notable exception: a create that succeeded upstream but
//! whose response was lost will be issued again and may duplicate the record.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations, including the first. Zero behaves as one.
    pub attempts: u32,

    /// Delay before the first retry; doubles after every failed attempt
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(attempts: u32, initial_delay: Duration) -> Self {
        Self {
            attempts,
            initial_delay,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Build a policy from configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_secs(config.retry_delay_secs),
        )
    }

    /// Invocation budget actually used
    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Delay waited after the `failure`-th failed attempt (1-based)
    pub fn delay_after(&self, failure: u32) -> Duration {
        let factor = 2u32.saturating_pow(failure.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Run `op` under `policy`, retrying transient failures
///
/// # Returns
///
/// - `Ok(T)`: the first successful result
/// - `Err(Error::RetriesExhausted)`: every attempt failed transiently
/// - `Err(Error::Cancelled)`: the token fired
/// - `Err(e)`: the first permanent error, unwrapped
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            res = op() => res,
        };

        let err = match outcome {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_transient() {
            debug!(attempt, error = %err, "permanent error, not retrying");
            return Err(err);
        }

        if attempt >= max_attempts {
            return Err(Error::RetriesExhausted {
                attempts: attempt,
                source: Box::new(err),
            });
        }

        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "retrying after error"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        delay = delay.saturating_mul(2);
    }
}
