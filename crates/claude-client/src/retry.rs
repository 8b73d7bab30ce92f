use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

// ─── Retryable ────────────────────────────────────────────────────────────

/// Errors that know whether the operation that produced them is worth
/// repeating unchanged.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

// ─── RetryAttempt ─────────────────────────────────────────────────────────

/// What the policy is about to do after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based number of the retry about to be made.
    pub attempt: u32,
    pub max_retries: u32,
    /// How long the policy sleeps before the retry.
    pub delay: Duration,
}

// ─── RetryPolicy ──────────────────────────────────────────────────────────

/// Fixed exponential backoff with a ceiling and no jitter.
///
/// The delay before retry `k` (0-based) is
/// `min(initial_delay * multiplier^k, max_delay)`. The policy holds no state
/// between calls to [`RetryPolicy::run`], so one value can be shared freely.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up on the first failure.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before the retry numbered `retry` (0 for the first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        let ceiling = self.max_delay.as_nanos() as f64;
        if !nanos.is_finite() || nanos >= ceiling {
            return self.max_delay;
        }
        Duration::from_nanos(nanos.max(0.0) as u64)
    }

    /// Run `op`, retrying transient failures.
    ///
    /// `on_retry` is told about each retry before the policy sleeps. Errors
    /// whose [`Retryable::is_retryable`] is false, and the error that
    /// exhausts `max_retries`, are returned as-is.
    pub async fn run<T, E, F, Fut, O>(&self, mut op: F, mut on_retry: O) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(&RetryAttempt, &E),
    {
        let mut retry = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_retries => {
                    let attempt = RetryAttempt {
                        attempt: retry + 1,
                        max_retries: self.max_retries,
                        delay: self.delay_for(retry),
                    };
                    tracing::warn!(
                        attempt = attempt.attempt,
                        max_retries = self.max_retries,
                        delay_ms = attempt.delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    on_retry(&attempt, &err);
                    tokio::time::sleep(attempt.delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
