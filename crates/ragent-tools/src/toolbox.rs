use ragent_core::{RagResult, ToolCall, ToolKind, ToolOutput};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::retrieval::RetrievalTool;
use crate::web_search::WebSearchTool;

/// Interface of one tool as offered to the reasoning model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub kind: ToolKind,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

impl ToolDescriptor {
    pub fn name(&self) -> &'static str {
        self.kind.wire_name()
    }

    fn for_kind(kind: ToolKind) -> Self {
        let (description, query_hint) = match kind {
            ToolKind::Retrieval => (
                "Retrieve grounded information from the local knowledge base.",
                "What to look up in the local documents",
            ),
            ToolKind::WebSearch => (
                "Search the web when local knowledge is insufficient.",
                "Web search query",
            ),
        };
        Self {
            kind,
            description: description.to_string(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": query_hint
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

/// The fixed tool set bound to one agent run.
pub struct Toolbox {
    retrieval: RetrievalTool,
    web_search: WebSearchTool,
}

impl Toolbox {
    pub fn new(retrieval: RetrievalTool, web_search: WebSearchTool) -> Self {
        Self {
            retrieval,
            web_search,
        }
    }

    /// One descriptor per [`ToolKind`], in [`ToolKind::ALL`] order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        ToolKind::ALL.into_iter().map(ToolDescriptor::for_kind).collect()
    }

    pub fn retrieval(&self) -> &RetrievalTool {
        &self.retrieval
    }

    /// Run the tool named by `call` with its query.
    pub async fn dispatch(&self, call: &ToolCall) -> RagResult<ToolOutput> {
        info!(call_id = %call.id, tool = %call.tool, query = %call.query, "Dispatching tool");
        let output = match call.tool {
            ToolKind::Retrieval => self.retrieval.run(&call.query).await?,
            ToolKind::WebSearch => self.web_search.run(&call.query).await?,
        };
        info!(
            call_id = %call.id,
            chars = output.content.chars().count(),
            truncated = output.truncated,
            "Tool finished"
        );
        Ok(output)
    }
}
