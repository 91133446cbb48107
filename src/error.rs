use std::time::Duration;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Tool involved in the failure, if any (e.g., "query_data")
    pub tool: Option<String>,
    /// Additional context about the error (e.g., expected shape, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "normalizer", "circuit_breaker", "registry")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the dispatch runtime.
///
/// This aggregates low-level failures into actionable, high-level categories.
/// Note that tool-call *parse* failures are never represented here: the
/// normalizer reports those as [`crate::normalizer::ParseOutcome::Malformed`]
/// data so callers can skip or surface them without unwinding.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Error executing tool '{tool}': {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    /// Transient upstream failure (model service, database). Retryable.
    #[error("Upstream error: {message}{}", format_context(.context))]
    Upstream {
        message: String,
        context: ErrorContext,
    },

    /// Fail-fast rejection from an open circuit breaker. Distinct so callers
    /// can apply their own degraded behavior instead of retrying.
    #[error("circuit breaker open ({}ms of cooldown remaining)", .cooldown_remaining.as_millis())]
    CircuitOpen { cooldown_remaining: Duration },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref tool) = ctx.tool {
        parts.push(format!("tool: {}", tool));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new transient upstream error with structured context
    pub fn upstream_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Upstream {
            message: msg.into(),
            context,
        }
    }

    /// Create a tool-execution error
    pub fn tool_execution(tool: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::ToolExecution {
            tool: tool.into(),
            message: msg.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Runtime { context, .. }
            | Error::Upstream { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Default retryability classification used by
    /// [`RetryPolicy`](crate::resilience::RetryPolicy) when the caller does
    /// not supply a predicate of its own.
    ///
    /// Only transient upstream failures are retryable. Configuration and
    /// tool-execution errors are deterministic, and a circuit-open rejection
    /// must reach the caller immediately so it can degrade instead of
    /// hammering the breaker.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Upstream { .. })
    }
}
