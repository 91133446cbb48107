use std::future::Future;
use std::time::{Duration, Instant};

use crate::{Error, ErrorContext, Result};

/// Circuit breaker state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation; calls pass through.
    Closed,
    /// Failing fast; calls are rejected until the cooldown elapses.
    Open,
    /// One trial call is admitted to probe recovery.
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerSnapshot {
    pub failure_threshold: u32,
    pub recovery_timeout_ms: u64,
    pub consecutive_failures: u32,
    pub state: CircuitState,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of consecutive failures that opens the circuit
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Set the cooldown before a recovery trial is admitted
    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    // Set iff state is Open or HalfOpen.
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding a chronically failing operation.
///
/// - Closed: every failure increments the consecutive-failure count; at the
///   threshold the circuit opens and records the open time.
/// - Open: calls are rejected with [`Error::CircuitOpen`] without invoking
///   the operation; once the recovery timeout elapses the next call is
///   admitted as a trial (HalfOpen).
/// - HalfOpen: exactly one trial is in flight; its success closes the
///   circuit and resets counters, its failure reopens with a fresh cooldown.
///
/// State transitions are guarded by a mutex: concurrent callers sharing one
/// breaker cannot race past the threshold check or both claim the trial
/// slot. Transitions are logged; the logging is advisory only.
pub struct CircuitBreaker {
    cfg: CircuitBreakerConfig,
    inner: std::sync::Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self {
            cfg,
            inner: std::sync::Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Check whether a call may proceed.
    ///
    /// Transitions Open -> HalfOpen when the cooldown has elapsed; in that
    /// case the call is admitted as the recovery trial. While a trial is
    /// pending, further calls are rejected.
    pub fn allow(&self) -> Result<()> {
        let mut inner = self.lock()?;
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let opened_at = inner.opened_at.unwrap_or_else(Instant::now);
                let elapsed = opened_at.elapsed();
                if elapsed >= self.cfg.recovery_timeout {
                    tracing::info!("circuit half-open, admitting recovery trial");
                    inner.state = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(Error::CircuitOpen {
                        cooldown_remaining: self.cfg.recovery_timeout - elapsed,
                    })
                }
            }
            // A trial is already in flight; reject until it reports.
            CircuitState::HalfOpen => Err(Error::CircuitOpen {
                cooldown_remaining: Duration::ZERO,
            }),
        }
    }

    /// Record a successful call.
    pub fn on_success(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.state == CircuitState::HalfOpen {
                tracing::info!("circuit closed, recovery trial succeeded");
            }
            inner.state = CircuitState::Closed;
            inner.consecutive_failures = 0;
            inner.opened_at = None;
        }
    }

    /// Record a failed call.
    pub fn on_failure(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            match inner.state {
                CircuitState::HalfOpen => {
                    tracing::warn!("circuit reopened, recovery trial failed");
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
                CircuitState::Closed => {
                    inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                    tracing::debug!(
                        failures = inner.consecutive_failures,
                        threshold = self.cfg.failure_threshold,
                        "circuit breaker recorded failure"
                    );
                    if inner.consecutive_failures >= self.cfg.failure_threshold {
                        tracing::warn!(
                            failures = inner.consecutive_failures,
                            "circuit opened after consecutive failures"
                        );
                        inner.state = CircuitState::Open;
                        inner.opened_at = Some(Instant::now());
                    }
                }
                // Failures reported while already open (e.g. from a call
                // admitted just before the transition) keep the circuit open.
                CircuitState::Open => {}
            }
        }
    }

    /// Run `op` under the breaker: check admission, invoke, record outcome.
    pub fn guard<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.allow()?;
        match op() {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(err)
            }
        }
    }

    /// Async variant of [`Self::guard`].
    pub async fn guard_async<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.allow()?;
        match op().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(err)
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner
            .lock()
            .map(|inner| inner.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let now = Instant::now();
        if let Ok(inner) = self.inner.lock() {
            let open_remaining_ms = match inner.state {
                CircuitState::Open => inner.opened_at.map(|opened| {
                    let until = opened + self.cfg.recovery_timeout;
                    if until > now {
                        (until - now).as_millis() as u64
                    } else {
                        0
                    }
                }),
                _ => None,
            };
            CircuitBreakerSnapshot {
                failure_threshold: self.cfg.failure_threshold,
                recovery_timeout_ms: self.cfg.recovery_timeout.as_millis() as u64,
                consecutive_failures: inner.consecutive_failures,
                state: inner.state,
                open_remaining_ms,
            }
        } else {
            CircuitBreakerSnapshot {
                failure_threshold: self.cfg.failure_threshold,
                recovery_timeout_ms: self.cfg.recovery_timeout.as_millis() as u64,
                consecutive_failures: 0,
                state: CircuitState::Closed,
                open_remaining_ms: None,
            }
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| {
            Error::runtime_with_context(
                "CircuitBreaker poisoned",
                ErrorContext::new().with_source("circuit_breaker"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn transient() -> Error {
        Error::upstream_with_context("timeout", ErrorContext::new())
    }

    #[test]
    fn config_defaults() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_builder() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(3)
            .with_recovery_timeout(Duration::from_secs(10));
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.recovery_timeout, Duration::from_secs(10));
    }

    #[test]
    fn initial_state_is_closed() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::default());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow().is_ok());
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.consecutive_failures, 0);
        assert!(snapshot.open_remaining_ms.is_none());
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::new().with_failure_threshold(5));
        cb.on_failure();
        cb.on_failure();
        assert_eq!(cb.snapshot().consecutive_failures, 2);

        cb.on_success();
        assert_eq!(cb.snapshot().consecutive_failures, 0);
    }

    #[test]
    fn opens_at_threshold_and_fails_fast() {
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::new()
                .with_failure_threshold(3)
                .with_recovery_timeout(Duration::from_secs(30)),
        );

        cb.on_failure();
        cb.on_failure();
        assert!(cb.allow().is_ok());

        cb.on_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(matches!(cb.allow(), Err(Error::CircuitOpen { .. })));
        assert!(cb.snapshot().open_remaining_ms.is_some());
    }

    #[test]
    fn open_circuit_rejects_without_invoking_operation() {
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::new()
                .with_failure_threshold(1)
                .with_recovery_timeout(Duration::from_secs(30)),
        );
        cb.on_failure();

        let mut invoked = false;
        let result = cb.guard(|| {
            invoked = true;
            Ok(())
        });
        assert!(matches!(result, Err(Error::CircuitOpen { .. })));
        assert!(!invoked);
    }

    #[test]
    fn half_open_admits_exactly_one_trial() {
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::new()
                .with_failure_threshold(1)
                .with_recovery_timeout(Duration::from_millis(20)),
        );
        cb.on_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        thread::sleep(Duration::from_millis(30));

        assert!(cb.allow().is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        // Trial still pending; nobody else gets through.
        assert!(matches!(cb.allow(), Err(Error::CircuitOpen { .. })));
    }

    #[test]
    fn trial_success_closes_circuit() {
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::new()
                .with_failure_threshold(1)
                .with_recovery_timeout(Duration::from_millis(10)),
        );
        cb.on_failure();
        thread::sleep(Duration::from_millis(20));

        let result = cb.guard(|| Ok("recovered"));
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.snapshot().consecutive_failures, 0);
        assert!(cb.allow().is_ok());
    }

    #[test]
    fn trial_failure_reopens_with_fresh_cooldown() {
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::new()
                .with_failure_threshold(1)
                .with_recovery_timeout(Duration::from_millis(30)),
        );
        cb.on_failure();
        thread::sleep(Duration::from_millis(40));

        let result: Result<()> = cb.guard(|| Err(transient()));
        assert!(matches!(result, Err(Error::Upstream { .. })));
        assert_eq!(cb.state(), CircuitState::Open);
        // Fresh cooldown: still rejecting right after the failed trial.
        assert!(matches!(cb.allow(), Err(Error::CircuitOpen { .. })));
    }

    #[test]
    fn guard_records_failures_toward_threshold() {
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::new()
                .with_failure_threshold(2)
                .with_recovery_timeout(Duration::from_secs(30)),
        );

        for _ in 0..2 {
            let _: Result<()> = cb.guard(|| Err(transient()));
        }
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn guard_async_passes_through_when_closed() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::default());
        let result = cb.guard_async(|| async { Ok(41 + 1) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn concurrent_failures_do_not_race_past_threshold() {
        use std::sync::Arc;

        let cb = Arc::new(CircuitBreaker::new(
            CircuitBreakerConfig::new().with_failure_threshold(100),
        ));

        let mut handles = vec![];
        for _ in 0..10 {
            let cb = Arc::clone(&cb);
            handles.push(thread::spawn(move || {
                for _ in 0..5 {
                    cb.on_failure();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(cb.snapshot().consecutive_failures, 50);
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
