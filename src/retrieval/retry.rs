//! Bounded retry loop with configurable backoff

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    /// `false` stops the retry loop immediately
    fn is_transient(&self) -> bool {
        true
    }
}

/// How the wait grows between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Always `base_delay`
    #[default]
    Constant,
    /// `base_delay * attempt`
    Linear,
    /// `base_delay * 2^(attempt - 1)`
    Exponential,
}

/// Retry budget for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff,
        }
    }

    /// Wait after the failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            Backoff::Constant => self.base_delay,
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(factor)
            }
        }
    }
}

/// Runs an async operation under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `operation` until it succeeds, fails with a non-transient error,
    /// or `max_attempts` calls have been made.
    ///
    /// `on_attempt(error, attempt)` runs before every backoff wait, never after
    /// the final attempt. The last error is always returned to the caller.
    pub async fn execute<T, E, Op, Fut, A>(&self, operation: Op, on_attempt: A) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
        A: FnMut(&E, u32),
    {
        self.execute_while(operation, on_attempt, || true).await
    }

    /// Like [`execute`](Self::execute), but gives up with the last error as
    /// soon as `is_live()` turns false, checked before and after each wait.
    pub async fn execute_while<T, E, Op, Fut, A, L>(
        &self,
        mut operation: Op,
        mut on_attempt: A,
        is_live: L,
    ) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
        A: FnMut(&E, u32),
        L: Fn() -> bool,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= max_attempts || !error.is_transient() {
                        tracing::debug!(
                            "Giving up after attempt {}/{}: {}",
                            attempt,
                            max_attempts,
                            error
                        );
                        return Err(error);
                    }
                    if !is_live() {
                        tracing::debug!("Abandoned after attempt {}: {}", attempt, error);
                        return Err(error);
                    }

                    tracing::warn!("Attempt {}/{} failed: {}", attempt, max_attempts, error);
                    on_attempt(&error, attempt);
                    tokio::time::sleep(self.policy.delay_for(attempt)).await;

                    if !is_live() {
                        tracing::debug!("Abandoned during backoff after attempt {}", attempt);
                        return Err(error);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
