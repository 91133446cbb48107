//! Graceful degradation helpers: fallbacks and feature toggles.
//!
//! These are explicit higher-order functions wrapping a call, composable
//! with [`RetryPolicy`](super::RetryPolicy) and
//! [`CircuitBreaker`](super::CircuitBreaker): wrap the primary in a breaker
//! or retry first, then hand the wrapped call to a fallback.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use crate::Result;

/// Run `primary`; on failure, log a warning and run `fallback` instead.
pub fn with_fallback<T, P, F>(primary: P, fallback: F) -> Result<T>
where
    P: FnOnce() -> Result<T>,
    F: FnOnce() -> Result<T>,
{
    match primary() {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(error = %err, "primary operation failed, using fallback");
            fallback()
        }
    }
}

/// Run `primary`; on failure, log a warning and substitute a fixed value.
pub fn with_fallback_value<T, P>(primary: P, fallback_value: T) -> T
where
    P: FnOnce() -> Result<T>,
{
    match primary() {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "primary operation failed, using fallback value");
            fallback_value
        }
    }
}

/// Async variant of [`with_fallback`].
pub async fn with_fallback_async<T, P, PF, F, FF>(primary: P, fallback: F) -> Result<T>
where
    P: FnOnce() -> PF,
    PF: Future<Output = Result<T>>,
    F: FnOnce() -> FF,
    FF: Future<Output = Result<T>>,
{
    match primary().await {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(error = %err, "primary operation failed, using fallback");
            fallback().await
        }
    }
}

/// Async variant of [`with_fallback_value`].
pub async fn with_fallback_value_async<T, P, PF>(primary: P, fallback_value: T) -> T
where
    P: FnOnce() -> PF,
    PF: Future<Output = Result<T>>,
{
    match primary().await {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "primary operation failed, using fallback value");
            fallback_value
        }
    }
}

/// Named boolean flags gating optional behavior.
///
/// An explicit object passed by reference to whatever needs it, never a
/// process-wide singleton. Reads and writes go through an `RwLock` so a
/// toggle set shared across tasks stays consistent.
#[derive(Debug, Default)]
pub struct FeatureToggles {
    flags: RwLock<HashMap<String, bool>>,
}

impl FeatureToggles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state of a feature.
    pub fn set(&self, feature: impl Into<String>, enabled: bool) {
        let feature = feature.into();
        tracing::info!(feature = %feature, enabled, "feature toggled");
        if let Ok(mut flags) = self.flags.write() {
            flags.insert(feature, enabled);
        }
    }

    /// Check a feature, falling back to `default` when it was never set.
    pub fn is_enabled(&self, feature: &str, default: bool) -> bool {
        self.flags
            .read()
            .ok()
            .and_then(|flags| flags.get(feature).copied())
            .unwrap_or(default)
    }

    /// Run `op` only when the feature is enabled; `None` otherwise.
    pub fn when_enabled<T, F>(&self, feature: &str, default: bool, op: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        if self.is_enabled(feature, default) {
            Some(op())
        } else {
            tracing::debug!(feature = %feature, "feature disabled, skipping");
            None
        }
    }

    /// Run `op` when the feature is enabled, `alternative` otherwise.
    pub fn with_alternative<T, F, A>(&self, feature: &str, default: bool, op: F, alternative: A) -> T
    where
        F: FnOnce() -> T,
        A: FnOnce() -> T,
    {
        if self.is_enabled(feature, default) {
            op()
        } else {
            tracing::debug!(feature = %feature, "feature disabled, using alternative");
            alternative()
        }
    }
}
