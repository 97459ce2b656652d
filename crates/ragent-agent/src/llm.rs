use crate::backends::openai::OpenAiBackend;
use crate::backends::LlmBackend;
use crate::config::ModelConfig;
use ragent_core::{Message, RagError, RagResult, ToolCall};
use ragent_tools::ToolDescriptor;

/// Response from the LLM: a final text, or a request to run tools.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    Done(String),
    ToolUse {
        /// Text emitted alongside the calls; often empty.
        content: String,
        tool_calls: Vec<ToolCall>,
    },
}

impl LlmResponse {
    pub fn content(&self) -> &str {
        match self {
            Self::Done(content) | Self::ToolUse { content, .. } => content,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            Self::Done(content) | Self::ToolUse { content, .. } => content,
        }
    }
}

/// Which capability a client stands for; failures are reported under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmRole {
    Reasoning,
    Evaluation,
}

impl LlmRole {
    fn tag(self, err: RagError) -> RagError {
        match (self, err) {
            (_, err @ RagError::Config(_)) => err,
            (Self::Reasoning, err @ RagError::Reasoning(_)) => err,
            (Self::Evaluation, err @ RagError::Evaluation(_)) => err,
            (Self::Reasoning, err) => RagError::Reasoning(err.to_string()),
            (Self::Evaluation, err) => RagError::Evaluation(err.to_string()),
        }
    }
}

/// LLM client for one role, dispatching to a provider backend.
pub struct LlmClient {
    backend: Box<dyn LlmBackend>,
    role: LlmRole,
}

impl LlmClient {
    pub fn new(config: ModelConfig, role: LlmRole) -> RagResult<Self> {
        let backend = OpenAiBackend::new(config).map_err(|e| role.tag(e))?;
        Ok(Self::from_backend(Box::new(backend), role))
    }

    /// Create from a pre-built backend (for custom providers and tests).
    pub fn from_backend(backend: Box<dyn LlmBackend>, role: LlmRole) -> Self {
        Self { backend, role }
    }

    pub fn role(&self) -> LlmRole {
        self.role
    }

    pub async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> RagResult<LlmResponse> {
        self.backend
            .chat(system_prompt, messages, tools)
            .await
            .map_err(|e| self.role.tag(e))
    }

    pub async fn complete(&self, prompt: &str) -> RagResult<String> {
        self.backend
            .complete(prompt)
            .await
            .map_err(|e| self.role.tag(e))
    }
}
