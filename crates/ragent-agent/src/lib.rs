//! Reasoning loop for ragent.
//!
//! [`AgentRunner`] drives a reasoning model through tool calls, then has an
//! evaluator model score the draft and refines it a bounded number of times.
//!
//! # Main types
//!
//! - [`AgentRunner`]: The REASON / ACT / EVALUATE state machine.
//! - [`LlmClient`]: Role-tagged client over an [`LlmBackend`].
//! - [`ModelConfig`] / [`LoopPolicy`]: Model and termination settings.
//! - [`ConversationWindow`]: Recent-history window handed to each run.

/// LLM provider backends.
pub mod backends;
/// Model and loop configuration.
pub mod config;
/// Conversation window.
pub mod context;
/// Evaluator score parsing.
pub mod evaluate;
/// Role-tagged LLM client and response type.
pub mod llm;
/// Prompt templates.
pub mod prompt;
/// The agent loop.
pub mod runner;
/// Loop state and phases.
pub mod state;

pub use backends::LlmBackend;
pub use config::{LlmProvider, LoopPolicy, ModelConfig};
pub use context::{ConversationWindow, DEFAULT_HISTORY_TURNS};
pub use evaluate::parse_score;
pub use llm::{LlmClient, LlmResponse, LlmRole};
pub use runner::{AgentOutcome, AgentRunner, ToolTraceEntry};
pub use state::{AgentState, Phase};
