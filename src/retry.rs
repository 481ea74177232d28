//! Bounded Retry Policy
//!
//! One retry shape is used everywhere a remote call can fail: a fixed number
//! of attempts, each attempt individually time-boxed, a fixed delay between
//! attempts. The gateway's fee-context fetch and the launch invoker both run
//! through this policy with their own parameters.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Fixed-backoff retry parameters for one call site
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts before giving up (floored at 1).
    pub max_attempts: u32,
    /// Time box applied to each individual attempt.
    pub attempt_timeout: Duration,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

/// Exhaustion report returned when every attempt failed
#[derive(Debug)]
pub struct RetryError<E> {
    pub operation: &'static str,
    pub attempts: u32,
    /// True only when every single attempt ran out its time box.
    pub timed_out: bool,
    pub last_error: Option<E>,
}

impl<E: std::fmt::Display> RetryError<E> {
    /// The most specific failure description available: the last underlying
    /// error, or the time-box report when no attempt produced one.
    pub fn reason(&self) -> String {
        match &self.last_error {
            Some(err) => err.to_string(),
            None => format!("every attempt timed out after {} tries", self.attempts),
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed after {} attempt(s): {}",
            self.operation,
            self.attempts,
            self.reason()
        )
    }
}

impl RetryPolicy {
    /// Run `attempt` until it succeeds or the policy is exhausted
    ///
    /// # Arguments
    /// * `operation` - Short label used in logs and the exhaustion report
    /// * `attempt` - Closure producing a fresh future per attempt
    ///
    /// # Returns
    /// The first successful value, or a `RetryError` describing the final
    /// failure once all attempts are spent. Success short-circuits the
    /// remaining attempts immediately.
    pub async fn run<T, E, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = None;
        let mut all_timed_out = true;

        for current in 1..=max_attempts {
            match tokio::time::timeout(self.attempt_timeout, attempt()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => {
                    warn!("{} attempt {}/{} failed: {}", operation, current, max_attempts, err);
                    all_timed_out = false;
                    last_error = Some(err);
                }
                Err(_) => {
                    warn!(
                        "{} attempt {}/{} timed out after {:?}",
                        operation, current, max_attempts, self.attempt_timeout
                    );
                }
            }

            if current < max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(RetryError {
            operation,
            attempts: max_attempts,
            timed_out: all_timed_out,
            last_error,
        })
    }
}
