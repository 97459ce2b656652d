use std::sync::Arc;

use ragent_core::{RagResult, ToolOutput};
use ragent_memory::{KbId, KnowledgeBaseStore, RetrievalHit};
use tracing::debug;

use crate::format::{truncate_chars, MAX_TOOL_OUTPUT_CHARS};

/// Returned instead of evidence when the knowledge base has nothing to offer.
pub const NO_LOCAL_INFO: &str = "NO_LOCAL_INFO";

/// Retrieval over one knowledge base, addressed through the store.
pub struct RetrievalTool {
    store: Arc<KnowledgeBaseStore>,
    kb_id: KbId,
    top_k: usize,
    max_chars: usize,
}

impl RetrievalTool {
    pub fn new(store: Arc<KnowledgeBaseStore>, kb_id: KbId, top_k: usize) -> Self {
        Self {
            store,
            kb_id,
            top_k,
            max_chars: MAX_TOOL_OUTPUT_CHARS,
        }
    }

    /// Override the output cap.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn kb_id(&self) -> KbId {
        self.kb_id
    }

    /// Retrieve and format evidence for `query`.
    ///
    /// Citations list the labels whose header survived truncation.
    pub async fn run(&self, query: &str) -> RagResult<ToolOutput> {
        let hits = self.store.retrieve(self.kb_id, query, self.top_k).await?;
        if hits.is_empty() {
            debug!(kb = %self.kb_id, "No local evidence");
            return Ok(ToolOutput::complete(NO_LOCAL_INFO));
        }

        let output = truncate_chars(&format_hits(&hits), self.max_chars);
        let citations = hits
            .iter()
            .filter(|hit| output.content.contains(&header(hit)))
            .map(|hit| hit.citation)
            .collect();
        debug!(
            kb = %self.kb_id,
            hits = hits.len(),
            truncated = output.truncated,
            "Retrieval tool output"
        );
        Ok(output.with_citations(citations))
    }
}

fn header(hit: &RetrievalHit) -> String {
    format!("[{}] ({})", hit.citation, hit.chunk.source)
}

/// `[n] (source)` followed by the chunk text, blocks separated by a blank line.
/// Asterisks are rewritten to `-` so chunk markup cannot read as emphasis.
pub fn format_hits(hits: &[RetrievalHit]) -> String {
    hits.iter()
        .map(|hit| format!("{}\n{}", header(hit), hit.chunk.text.replace('*', "-")))
        .collect::<Vec<_>>()
        .join("\n\n")
}
