//! Retry with exponential backoff.
//!
//! A [`RetryPolicy`] is constructed once and applied per call; it keeps no
//! state across calls. Attempts are strictly sequential: the async variant
//! suspends via `tokio::time::sleep` during backoff so other tasks proceed,
//! but the retried operation itself is never run concurrently with its own
//! earlier attempts. There is no cancellation primitive; a retry sequence
//! runs to success, exhaustion, or a non-retryable error.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

/// Configuration for retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (>= 1).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each attempt (>= 1.0).
    pub backoff_multiplier: f64,
    /// Each delay is randomized within +/- this fraction of its computed
    /// value (0.0 disables jitter; must be <= 1.0).
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter_fraction: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Deterministic backoff for a given zero-based attempt index:
    /// `base_delay * backoff_multiplier^attempt_index`.
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt_index as i32);
        Duration::from_secs_f64(secs)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_fraction <= 0.0 {
            return delay;
        }
        let base = delay.as_secs_f64();
        let spread = base * self.jitter_fraction;
        let secs = rand::thread_rng().gen_range((base - spread)..=(base + spread));
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Run `op`, retrying errors classified by [`Error::is_retryable`].
    pub fn execute<T, F>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        self.execute_if(op, Error::is_retryable)
    }

    /// Run `op`, retrying errors for which `retryable` returns true.
    ///
    /// Success returns immediately; a non-retryable error propagates without
    /// further attempts; a retryable error on the final attempt propagates
    /// as-is.
    pub fn execute_if<T, F, P>(&self, mut op: F, retryable: P) -> Result<T>
    where
        F: FnMut() -> Result<T>,
        P: Fn(&Error) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !retryable(&err) || attempt + 1 >= attempts {
                        return Err(err);
                    }
                    let delay = self.jittered(self.backoff(attempt));
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after transient failure"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Async variant of [`Self::execute`].
    pub async fn execute_async<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_async_if(op, Error::is_retryable).await
    }

    /// Async variant of [`Self::execute_if`]. Suspends cooperatively during
    /// backoff so other pending work can proceed.
    pub async fn execute_async_if<T, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&Error) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !retryable(&err) || attempt + 1 >= attempts {
                        return Err(err);
                    }
                    let delay = self.jittered(self.backoff(attempt));
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorContext;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_jitter_fraction(0.0)
    }

    fn transient() -> Error {
        Error::upstream_with_context("connection reset", ErrorContext::new())
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result = fast_policy(5).execute(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(transient())
            } else {
                Ok("ok")
            }
        });
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhausts_attempts_and_propagates_last_error() {
        let calls = Cell::new(0u32);
        let result: Result<()> = fast_policy(4).execute(|| {
            calls.set(calls.get() + 1);
            Err(transient())
        });
        assert!(matches!(result, Err(Error::Upstream { .. })));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn non_retryable_error_propagates_immediately() {
        let calls = Cell::new(0u32);
        let result: Result<()> = fast_policy(5).execute(|| {
            calls.set(calls.get() + 1);
            Err(Error::tool_execution("query_data", "syntax error"))
        });
        assert!(matches!(result, Err(Error::ToolExecution { .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn custom_predicate_overrides_default_classification() {
        let calls = Cell::new(0u32);
        // Treat tool-execution errors as retryable for this call only.
        let result: Result<()> = fast_policy(3).execute_if(
            || {
                calls.set(calls.get() + 1);
                Err(Error::tool_execution("query_data", "locked"))
            },
            |err| matches!(err, Error::ToolExecution { .. }),
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn backoff_grows_exponentially() {
        let policy = RetryPolicy::new()
            .with_base_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0);
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn jitter_stays_within_fraction() {
        let policy = RetryPolicy::new()
            .with_base_delay(Duration::from_millis(100))
            .with_jitter_fraction(0.1);
        for _ in 0..100 {
            let delay = policy.jittered(policy.backoff(0));
            assert!(delay >= Duration::from_millis(90), "delay {:?}", delay);
            assert!(delay <= Duration::from_millis(110), "delay {:?}", delay);
        }
    }

    #[test]
    fn max_attempts_is_clamped_to_one() {
        let calls = Cell::new(0u32);
        let result: Result<()> = fast_policy(0).execute(|| {
            calls.set(calls.get() + 1);
            Err(transient())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn async_variant_retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = fast_policy(5)
            .execute_async(move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(transient())
                    } else {
                        Ok(7u32)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn async_variant_exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<()> = fast_policy(3)
            .execute_async(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
