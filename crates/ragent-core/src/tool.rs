use crate::error::{RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of tools the reasoning model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Hybrid retrieval over the bound knowledge base.
    Retrieval,
    /// Live web search.
    WebSearch,
}

impl ToolKind {
    /// Every tool, in the order they are offered to the model.
    pub const ALL: [ToolKind; 2] = [ToolKind::Retrieval, ToolKind::WebSearch];

    /// The name used on the wire when binding tools to a model.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Retrieval => "retrieval",
            Self::WebSearch => "web_search",
        }
    }

    /// Resolve a model-supplied tool name.
    ///
    /// Unknown names are a configuration error: the model was only ever
    /// offered the names in [`ToolKind::ALL`].
    pub fn from_wire(name: &str) -> RagResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.wire_name() == name)
            .ok_or_else(|| RagError::Config(format!("Unknown tool requested: {name}")))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A request from the reasoning model to invoke a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier assigned by the model for this call.
    pub id: String,
    /// Which tool to invoke.
    pub tool: ToolKind,
    /// The query argument.
    pub query: String,
}

impl ToolCall {
    /// Creates a tool call.
    pub fn new(id: impl Into<String>, tool: ToolKind, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool,
            query: query.into(),
        }
    }
}

/// Text produced by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The (possibly truncated) content.
    pub content: String,
    /// Whether trailing content was dropped to fit the output cap.
    pub truncated: bool,
    /// Citation labels the content refers to; only retrieval fills these.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<usize>,
}

impl ToolOutput {
    /// An untruncated output.
    pub fn complete(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            truncated: false,
            citations: Vec::new(),
        }
    }

    /// Attach the citation labels that were offered to the model.
    pub fn with_citations(mut self, citations: Vec<usize>) -> Self {
        self.citations = citations;
        self
    }
}
