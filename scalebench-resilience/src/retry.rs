//! Bounded retry of fallible async operations

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How often and how far apart an operation is attempted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Pause between two attempts
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl RetryPolicy {
    /// `max_attempts` tries, exactly `interval` apart
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Runs an operation under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Runs `operation` with the 1-based attempt number until it succeeds,
    /// fails permanently, or the policy's attempts are spent
    pub async fn execute_with_context<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Succeeded on attempt {}", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                debug!("Attempt {} failed permanently: {}", attempt, error);
                return Err(RetryError::NonRetryable(error));
            }
            if attempt >= max_attempts {
                warn!("Giving up after {} attempts: {}", attempt, error);
                return Err(RetryError::MaxAttemptsExceeded {
                    attempts: attempt,
                    last_error: error,
                });
            }

            debug!(
                "Attempt {} of {} failed ({}), next in {:?}",
                attempt, max_attempts, error, self.policy.interval
            );
            tokio::time::sleep(self.policy.interval).await;
            attempt += 1;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: E },

    #[error("{0}")]
    NonRetryable(E),
}
