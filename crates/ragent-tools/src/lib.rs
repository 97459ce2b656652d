//! The two evidence sources offered to the reasoning loop.
//!
//! - [`RetrievalTool`]: Hybrid retrieval over one knowledge base.
//! - [`WebSearchTool`]: Web search through a [`WebSearchProvider`].
//! - [`Toolbox`]: Fixed dispatch table over [`ragent_core::ToolKind`].

/// Output capping shared by both tools.
pub mod format;
/// Local retrieval tool.
pub mod retrieval;
/// Tool descriptors and dispatch.
pub mod toolbox;
/// Web search provider trait, DuckDuckGo scraper, and tool.
pub mod web_search;

pub use format::{truncate_chars, MAX_TOOL_OUTPUT_CHARS};
pub use retrieval::{RetrievalTool, NO_LOCAL_INFO};
pub use toolbox::{ToolDescriptor, Toolbox};
pub use web_search::{
    DuckDuckGoSearch, WebHit, WebSearchConfig, WebSearchProvider, WebSearchTool, NO_WEB_RESULTS,
};
