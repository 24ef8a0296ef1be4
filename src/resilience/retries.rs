//! Retry executor.
//!
//! # Responsibilities
//! - Run an async operation until it succeeds, fails fatally, or runs out
//!   of attempts
//! - Sleep the linear backoff between attempts without blocking the thread
//! - Report which of those three endings happened, with attempt counts
//!
//! # Design Decisions
//! - The outcome is a [`RetryError`] rather than the bare error, so callers
//!   can treat exhaustion differently from a fatal first failure
//! - Shutdown is checked before each attempt and raced against the backoff
//!   sleep; an attempt already in flight always completes

use std::fmt::Display;
use std::future::Future;

use thiserror::Error;

use crate::lifecycle::shutdown::{wait_triggered, Shutdown};
use crate::observability::metrics;
use crate::resilience::backoff::RetryPolicy;
use crate::resilience::classify::Classify;

/// How a retried call ended when it did not succeed.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// A non-retryable error; no further attempts were made.
    #[error("{operation} failed on attempt {attempt}: {error}")]
    Fatal {
        operation: String,
        attempt: u32,
        error: E,
    },

    /// Every allowed attempt failed with a retryable error.
    #[error("{operation} failed after {attempts} attempt(s): {error}")]
    Exhausted {
        operation: String,
        attempts: u32,
        error: E,
    },

    /// Shutdown was requested before the call could finish.
    #[error("{operation} cancelled after {attempts} attempt(s)")]
    Cancelled { operation: String, attempts: u32 },
}

impl<E> RetryError<E> {
    /// Name the call was made under.
    pub fn operation(&self) -> &str {
        match self {
            RetryError::Fatal { operation, .. }
            | RetryError::Exhausted { operation, .. }
            | RetryError::Cancelled { operation, .. } => operation,
        }
    }

    /// Attempts actually made.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Fatal { attempt, .. } => *attempt,
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// The last error returned by the operation, if there was one.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Fatal { error, .. } | RetryError::Exhausted { error, .. } => Some(error),
            RetryError::Cancelled { .. } => None,
        }
    }
}

/// Runs fallible async operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    shutdown: Option<Shutdown>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            shutdown: None,
        }
    }

    /// Stop retrying once `shutdown` is triggered.
    pub fn with_shutdown(mut self, shutdown: &Shutdown) -> Self {
        self.shutdown = Some(shutdown.clone());
        self
    }

    /// Execute `op`, retrying transient failures.
    ///
    /// `operation` names the call in logs and metrics.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        let max_attempts = self.policy.attempts();
        let mut cancel = self.shutdown.as_ref().map(Shutdown::subscribe);
        let mut attempt: u32 = 0;

        loop {
            if self.shutdown.as_ref().is_some_and(Shutdown::is_triggered) {
                tracing::warn!(operation, attempts = attempt, "Shutdown requested, abandoning call");
                return Err(RetryError::Cancelled {
                    operation: operation.to_string(),
                    attempts: attempt,
                });
            }

            metrics::record_attempt(operation);
            let error = match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(operation, attempts = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let number = attempt + 1;
            let class = error.class();
            metrics::record_failure(operation, class);

            if !class.is_retryable() {
                tracing::error!(
                    operation,
                    attempt = number,
                    max_attempts,
                    error = %error,
                    "Fatal error, not retrying"
                );
                return Err(RetryError::Fatal {
                    operation: operation.to_string(),
                    attempt: number,
                    error,
                });
            }

            if number >= max_attempts {
                tracing::error!(
                    operation,
                    attempts = number,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(RetryError::Exhausted {
                    operation: operation.to_string(),
                    attempts: number,
                    error,
                });
            }

            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                operation,
                attempt = number,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient error, retrying"
            );
            metrics::record_retry(operation);

            match cancel.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        true = wait_triggered(rx) => {
                            tracing::warn!(operation, attempts = number, "Shutdown requested during backoff");
                            return Err(RetryError::Cancelled {
                                operation: operation.to_string(),
                                attempts: number,
                            });
                        }
                    }
                }
                None => tokio::time::sleep(delay).await,
            }

            attempt = number;
        }
    }
}
