//! Core types and error definitions for the ragent workspace.
//!
//! This crate provides the foundational types shared by the retrieval,
//! tool, and agent crates: the error taxonomy, the conversation message
//! model, and the closed set of tools the agent loop may invoke.
//!
//! # Main types
//!
//! - [`RagError`]: Unified error enum; each variant names the capability or
//!   subsystem the failure came from.
//! - [`RagResult`]: Convenience alias for `Result<T, RagError>`.
//! - [`Message`]: A user, assistant, or tool-result message.
//! - [`ToolKind`]: The fixed tool set (`retrieval`, `web_search`).
//! - [`ToolCall`]: A pending tool invocation requested by the reasoning model.
//! - [`ToolOutput`]: Text returned by a tool, plus whether it was truncated.

/// Error taxonomy.
pub mod error;
/// Conversation message model.
pub mod message;
/// Tool call request and result types.
pub mod tool;

pub use error::{RagError, RagResult};
pub use message::Message;
pub use tool::{ToolCall, ToolKind, ToolOutput};
