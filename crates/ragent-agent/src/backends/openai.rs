use super::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use crate::llm::LlmResponse;
use async_trait::async_trait;
use ragent_core::{Message, RagError, RagResult, ToolCall, ToolKind};
use ragent_tools::ToolDescriptor;
use std::time::Duration;
use tracing::debug;

/// OpenAI-compatible chat-completions backend.
///
/// Works with OpenAI, OpenRouter, Groq, and Ollama's `/v1` endpoint.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: ModelConfig) -> RagResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    fn build_messages(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
    ) -> Vec<serde_json::Value> {
        let mut api_messages: Vec<serde_json::Value> = Vec::new();

        if let Some(sys) = system_prompt {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }

        for m in messages {
            let value = match m {
                Message::User { content } => serde_json::json!({
                    "role": "user",
                    "content": content
                }),
                Message::Assistant {
                    content,
                    tool_calls,
                } if !tool_calls.is_empty() => serde_json::json!({
                    "role": "assistant",
                    "content": content,
                    "tool_calls": tool_calls.iter().map(encode_tool_call).collect::<Vec<_>>(),
                }),
                Message::Assistant { content, .. } => serde_json::json!({
                    "role": "assistant",
                    "content": content
                }),
                Message::ToolResult {
                    call_id, content, ..
                } => serde_json::json!({
                    "role": "tool",
                    "tool_call_id": call_id,
                    "content": content
                }),
            };
            api_messages.push(value);
        }

        api_messages
    }

    fn build_tools(&self, tools: &[ToolDescriptor]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description,
                        "parameters": t.parameters_schema,
                    }
                })
            })
            .collect()
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Content-Type", "application/json");
        let request = if self.config.api_key.is_empty() {
            request
        } else {
            request.header("Authorization", format!("Bearer {}", self.config.api_key))
        };

        // OpenRouter asks clients to identify themselves
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request.header("X-Title", "ragent")
        } else {
            request
        }
    }
}

fn encode_tool_call(call: &ToolCall) -> serde_json::Value {
    serde_json::json!({
        "id": call.id,
        "type": "function",
        "function": {
            "name": call.tool.wire_name(),
            "arguments": serde_json::json!({ "query": call.query }).to_string(),
        }
    })
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> RagResult<LlmResponse> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url().trim_end_matches('/')
        );
        let api_messages = self.build_messages(system_prompt, messages);

        let mut body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": api_messages,
            "stream": false,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(self.build_tools(tools));
        }

        debug!(
            model = %self.config.model_id,
            messages = messages.len(),
            tools = tools.len(),
            "Chat completion request"
        );

        let request = self.add_provider_headers(self.http.post(&url));

        let resp = request
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| RagError::Http(format!("Unreadable response body: {e}")))?;

        if !status.is_success() {
            return Err(RagError::Http(format!("Chat API error {status}: {text}")));
        }

        let resp_body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| RagError::Reasoning(format!("Chat response is not JSON: {e}")))?;
        parse_openai_response(&resp_body)
    }
}

/// Decode a chat-completions body.
///
/// Tool names are resolved against [`ToolKind`]; an unknown name fails with
/// [`RagError::Config`]. Missing call ids are filled positionally.
pub fn parse_openai_response(body: &serde_json::Value) -> RagResult<LlmResponse> {
    let message = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| RagError::Reasoning(format!("Malformed chat response: {body}")))?;
    let content = message["content"].as_str().unwrap_or_default().to_string();

    let calls = match message["tool_calls"].as_array() {
        Some(calls) if !calls.is_empty() => calls,
        _ => return Ok(LlmResponse::Done(content)),
    };

    let tool_calls = calls
        .iter()
        .enumerate()
        .map(|(index, tc)| {
            let name = tc["function"]["name"].as_str().ok_or_else(|| {
                RagError::Reasoning("Tool call without a function name".to_string())
            })?;
            let tool = ToolKind::from_wire(name)?;
            let id = tc["id"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("call_{index}"));
            Ok(ToolCall::new(id, tool, query_argument(&tc["function"]["arguments"])))
        })
        .collect::<RagResult<Vec<_>>>()?;

    Ok(LlmResponse::ToolUse {
        content,
        tool_calls,
    })
}

/// `arguments` is a JSON string for OpenAI-style providers and an object for
/// some local servers. A missing query becomes the empty string.
fn query_argument(arguments: &serde_json::Value) -> String {
    let parsed;
    let args = match arguments.as_str() {
        Some(raw) => {
            parsed = serde_json::from_str::<serde_json::Value>(raw).unwrap_or_default();
            &parsed
        }
        None => arguments,
    };
    args["query"].as_str().unwrap_or_default().to_string()
}
