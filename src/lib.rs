//! # mcp-dispatch
//!
//! Tool-call normalization and resilience primitives for MCP-style LLM tool
//! dispatch.
//!
//! ## Overview
//!
//! LLM runtimes emit tool-call intent in incompatible wire shapes: a typed
//! `tool_calls` list on the message, or a freeform `<toolcall>{...}</toolcall>`
//! block embedded in the text content. This library normalizes both into one
//! canonical [`ToolCall`] (name plus a JSON object of arguments), dispatches
//! it against an explicitly registered tool set, and wraps the fallible
//! edges (model service, database) in retry, circuit-breaker, and fallback
//! primitives.
//!
//! ## Core Philosophy
//!
//! - **One seam for wire variability**: only the [`normalizer`] knows about
//!   provider formats; dispatch logic sees canonical calls.
//! - **Parse failures are data**: the normalizer reports malformed tool
//!   calls as [`ParseOutcome::Malformed`], never as a raised error, so the
//!   caller decides whether to skip, retry, or surface them.
//! - **Explicit over ambient**: registries, toggles, and policies are plain
//!   objects passed by reference; no global singletons, no runtime plugin
//!   discovery.
//!
//! ## Quick Start
//!
//! ```rust
//! use mcp_dispatch::{ModelMessage, Normalizer, ParseOutcome};
//!
//! let normalizer = Normalizer::default();
//! let message = ModelMessage::text(
//!     "<toolcall>{\"type\": \"function\", \"arguments\": {\"sql\": \"SELECT 1\"}}</toolcall>",
//! );
//!
//! match normalizer.parse(&message) {
//!     ParseOutcome::Call(call) => println!("invoke {} with {:?}", call.name, call.arguments),
//!     ParseOutcome::Text => println!("plain response"),
//!     ParseOutcome::Malformed { reason, .. } => eprintln!("bad tool call: {}", reason),
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`normalizer`] | Tool-call normalization across wire formats |
//! | [`registry`] | Explicit tool registration and async dispatch |
//! | [`resilience`] | Retry, circuit breaker, fallback, feature toggles |
//! | [`types`] | Core type definitions (calls, results, wire shapes) |

pub mod normalizer;
pub mod registry;
pub mod resilience;
pub mod types;

// Re-export main types for convenience
pub use normalizer::{Normalizer, ParseOutcome, TagHeuristics};
pub use registry::{ToolHandler, ToolRegistry};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryPolicy};
pub use types::{ModelMessage, RawToolCall, ToolCall, ToolDefinition, ToolResult};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
