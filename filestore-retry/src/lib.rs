//! Unified retry and backoff logic for FileStore storage backends
//!
//! This crate provides the retry policy and execution loop shared by all
//! remote storage backends in the FileStore ecosystem. Retries are
//! count-based: an operation is attempted once and retried up to
//! `max_retries` additional times on transient failures, sleeping an
//! exponentially growing delay (capped at `max_delay`) between attempts.
//! Permanent failures short-circuit without retrying.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Retry configuration attached to a storage backend at construction.
///
/// Immutable for the lifetime of the backend that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RetrySettings", into = "RetrySettings")]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound on the per-retry delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// A policy that never retries; every failure surfaces immediately.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Delay to sleep before the given retry (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Wire representation of a retry policy: whole seconds, matching the
/// `retry_settings` block of a FileStore configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrySettings {
    max_retries: u32,
    retry_delay: u64,
    max_delay: u64,
}

impl From<RetrySettings> for RetryPolicy {
    fn from(s: RetrySettings) -> Self {
        RetryPolicy::new(
            s.max_retries,
            Duration::from_secs(s.retry_delay),
            Duration::from_secs(s.max_delay),
        )
    }
}

impl From<RetryPolicy> for RetrySettings {
    fn from(p: RetryPolicy) -> Self {
        RetrySettings {
            max_retries: p.max_retries,
            retry_delay: p.base_delay.as_secs(),
            max_delay: p.max_delay.as_secs(),
        }
    }
}

/// Classification of a failed attempt, produced by the operation closure.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Expected to be recoverable (timeout, throttling); eligible for retry.
    Transient(E),
    /// Not recoverable (auth, not-found); fails immediately.
    Permanent(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Transient(e) | RetryError::Permanent(e) => e,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Transient(e) => write!(f, "transient error: {e}"),
            RetryError::Permanent(e) => write!(f, "permanent error: {e}"),
        }
    }
}

/// Terminal outcome of a retried operation.
#[derive(Error, Debug)]
pub enum RetryFailure<E: fmt::Display + fmt::Debug> {
    #[error("operation '{operation}' still failing after {attempts} attempts: {error}")]
    Exhausted {
        operation: &'static str,
        attempts: u32,
        error: E,
    },
    #[error("operation '{operation}' failed permanently: {error}")]
    Permanent {
        operation: &'static str,
        error: E,
    },
}

impl<E: fmt::Display + fmt::Debug> RetryFailure<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryFailure::Exhausted { error, .. } | RetryFailure::Permanent { error, .. } => {
                error
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryFailure::Exhausted { .. })
    }
}

/// Execute `f` under the given policy, blocking the calling thread for the
/// duration of any backoff sleeps.
///
/// The closure is invoked once, then once more per retry up to
/// `policy.max_retries`. A `Permanent` error returns on the spot with zero
/// retries spent.
pub fn with_retry<T, E, F>(
    policy: &RetryPolicy,
    op_name: &'static str,
    mut f: F,
) -> Result<T, RetryFailure<E>>
where
    E: fmt::Display + fmt::Debug,
    F: FnMut() -> Result<T, RetryError<E>>,
{
    let mut retries = 0u32;

    loop {
        match f() {
            Ok(result) => {
                if retries > 0 {
                    debug!(
                        operation = op_name,
                        retries, "operation succeeded after retrying"
                    );
                }
                return Ok(result);
            }
            Err(RetryError::Permanent(e)) => {
                warn!(operation = op_name, error = %e, "operation failed permanently");
                return Err(RetryFailure::Permanent {
                    operation: op_name,
                    error: e,
                });
            }
            Err(RetryError::Transient(e)) => {
                if retries >= policy.max_retries {
                    warn!(
                        operation = op_name,
                        attempts = retries + 1,
                        error = %e,
                        "retries exhausted"
                    );
                    return Err(RetryFailure::Exhausted {
                        operation: op_name,
                        attempts: retries + 1,
                        error: e,
                    });
                }

                retries += 1;
                let delay = policy.delay_for(retries);
                warn!(
                    operation = op_name,
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, retrying"
                );
                std::thread::sleep(delay);
            }
        }
    }
}
