//! # Resilience Primitives Module
//!
//! This module provides opt-in resilience patterns for tool dispatch and
//! model calls that gracefully handle failures.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`retry`] | Retry with exponential backoff and jitter |
//! | [`circuit_breaker`] | Circuit breaker pattern for failure isolation |
//! | [`degrade`] | Fallbacks and feature toggles for graceful degradation |
//!
//! ## Circuit Breaker
//!
//! The circuit breaker prevents repeated calls to a failing dependency:
//! - **Closed**: Normal operation, requests pass through
//! - **Open**: Failures exceeded threshold, requests fail fast
//! - **Half-Open**: Testing if the dependency has recovered
//!
//! ```rust
//! use mcp_dispatch::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::new()
//!     .with_failure_threshold(5)
//!     .with_recovery_timeout(Duration::from_secs(30));
//! let breaker = CircuitBreaker::new(config);
//!
//! if breaker.allow().is_ok() {
//!     // Make the call...
//!     breaker.on_success();
//! }
//! ```
//!
//! ## Retry
//!
//! ```rust
//! use mcp_dispatch::resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new()
//!     .with_max_attempts(3)
//!     .with_base_delay(Duration::from_millis(200));
//!
//! let result: mcp_dispatch::Result<&str> = policy.execute(|| Ok("done"));
//! ```
//!
//! The pieces compose: wrap an operation in a retry policy, guard the result
//! with a breaker, and hand the guarded call to [`degrade::with_fallback`]
//! for a degraded answer once the policy is exhausted.

pub mod circuit_breaker;
pub mod degrade;
pub mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitState,
};
pub use degrade::{
    with_fallback, with_fallback_async, with_fallback_value, with_fallback_value_async,
    FeatureToggles,
};
pub use retry::RetryPolicy;
