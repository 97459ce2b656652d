use thiserror::Error;

/// A convenience `Result` alias using [`RagError`].
pub type RagResult<T> = Result<T, RagError>;

/// Top-level error type for ragent.
///
/// Capability variants (`Embedding`, `Reasoning`, `Evaluation`, `WebSearch`,
/// `Http`) identify which external backend failed. A low evaluation score is
/// never an error; only an unreachable or malformed backend is.
#[derive(Error, Debug)]
pub enum RagError {
    /// The embedding backend failed or returned a malformed response.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The reasoning model failed or returned a malformed response.
    #[error("Reasoning error: {0}")]
    Reasoning(String),

    /// The evaluation model could not be reached.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// The web-search backend failed.
    #[error("Web search error: {0}")]
    WebSearch(String),

    /// A retrieval index is inconsistent (e.g. embedding dimension mismatch).
    #[error("Index error: {0}")]
    Index(String),

    /// A knowledge base lookup failed.
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// The agent loop violated one of its own bounds.
    #[error("Agent error: {0}")]
    Agent(String),

    /// Invalid configuration, including unknown tool names.
    #[error("Config error: {0}")]
    Config(String),

    /// Transport-level failure of an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Whether the error originated in an external capability backend.
    pub fn is_capability_error(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_)
                | Self::Reasoning(_)
                | Self::Evaluation(_)
                | Self::WebSearch(_)
                | Self::Http(_)
        )
    }
}
