use crate::tool::{ToolCall, ToolKind};
use serde::{Deserialize, Serialize};

/// A single message in an agent conversation.
///
/// Assistant messages may carry pending tool-call requests; tool results
/// are tagged with the id of the call that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// A human end-user turn.
    User {
        /// The textual content of the message.
        content: String,
    },
    /// A reasoning-model turn.
    Assistant {
        /// The textual content of the message (may be empty on tool turns).
        content: String,
        /// Tool invocations requested in this turn.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Output of an executed tool call.
    ToolResult {
        /// Id of the originating [`ToolCall`].
        call_id: String,
        /// Which tool produced the output.
        tool: ToolKind,
        /// The tool's textual output.
        content: String,
    },
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates an assistant message with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Creates an assistant message carrying pending tool calls.
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Creates a tool-result message for the given call.
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self::ToolResult {
            call_id: call.id.clone(),
            tool: call.tool,
            content: content.into(),
        }
    }

    /// The textual content of any variant.
    pub fn content(&self) -> &str {
        match self {
            Self::User { content }
            | Self::Assistant { content, .. }
            | Self::ToolResult { content, .. } => content,
        }
    }

    /// Pending tool calls; empty for anything but a tool-using assistant turn.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}
