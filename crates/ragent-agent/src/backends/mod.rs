pub mod openai;

use crate::llm::LlmResponse;
use async_trait::async_trait;
use ragent_core::{Message, RagResult};
use ragent_tools::ToolDescriptor;

/// Trait for LLM provider backends.
///
/// Every supported provider speaks the OpenAI chat-completions dialect, so
/// [`openai::OpenAiBackend`] is the only network implementation; tests plug
/// in scripted backends through [`crate::LlmClient::from_backend`].
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Chat completion with an optional system prompt and bound tools.
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> RagResult<LlmResponse>;

    /// Single-prompt completion with no tools; returns the text content.
    async fn complete(&self, prompt: &str) -> RagResult<String> {
        let response = self.chat(None, &[Message::user(prompt)], &[]).await?;
        Ok(response.into_content())
    }
}
