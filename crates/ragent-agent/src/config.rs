use ragent_core::{RagError, RagResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama server through its OpenAI-compatible endpoint. No API key.
    Ollama,
    OpenAi,
    OpenRouter,
    /// Groq cloud inference, OpenAI-compatible.
    Groq,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: LlmProvider,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> LlmProvider {
    LlmProvider::Ollama
}

fn default_model_id() -> String {
    "ministral-3:3b".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: default_model_id(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelConfig {
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                LlmProvider::Ollama => "http://localhost:11434",
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
            }
        }
    }

    /// The same model with deterministic sampling, for scoring answers.
    pub fn for_evaluation(&self) -> Self {
        Self {
            temperature: 0.0,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> RagResult<()> {
        if self.model_id.trim().is_empty() {
            return Err(RagError::Config("model_id must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::Config(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if self.provider != LlmProvider::Ollama && self.api_key.is_empty() {
            return Err(RagError::Config(format!(
                "Provider {:?} requires an api_key",
                self.provider
            )));
        }
        Ok(())
    }
}

/// Termination policy of the agent loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopPolicy {
    /// Scores at or above this end the loop.
    pub quality_threshold: f32,
    /// Refinement cycles allowed before the current answer is accepted anyway.
    pub max_retries: u32,
    /// Upper bound on reasoning calls in one run.
    pub max_reason_turns: u32,
    /// Send the question and previous answer along with the refinement request.
    pub refine_with_context: bool,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self {
            quality_threshold: 0.7,
            max_retries: 2,
            max_reason_turns: 20,
            refine_with_context: false,
        }
    }
}

impl LoopPolicy {
    /// Whether the loop ends with the current answer.
    pub fn accepts(&self, score: f32, retries: u32) -> bool {
        score >= self.quality_threshold || retries >= self.max_retries
    }

    pub fn validate(&self) -> RagResult<()> {
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(RagError::Config(format!(
                "quality_threshold must be within [0, 1], got {}",
                self.quality_threshold
            )));
        }
        if self.max_reason_turns == 0 {
            return Err(RagError::Config(
                "max_reason_turns must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_serialization() {
        assert_eq!(serde_json::to_string(&LlmProvider::OpenRouter).unwrap(), "\"openrouter\"");
        let p: LlmProvider = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(p, LlmProvider::Ollama);
    }

    #[test]
    fn test_base_url_defaults() {
        let mut config = ModelConfig::default();
        assert_eq!(config.base_url(), "http://localhost:11434");
        config.provider = LlmProvider::Groq;
        assert_eq!(config.base_url(), "https://api.groq.com/openai");
        config.api_base_url = Some("http://proxy:8080".to_string());
        assert_eq!(config.base_url(), "http://proxy:8080");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ModelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ModelConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_evaluation_variant_is_deterministic() {
        let eval = ModelConfig::default().for_evaluation();
        assert_eq!(eval.temperature, 0.0);
        assert_eq!(eval.model_id, ModelConfig::default().model_id);
    }

    #[test]
    fn test_hosted_provider_needs_key() {
        let config = ModelConfig {
            provider: LlmProvider::OpenAi,
            ..ModelConfig::default()
        };
        assert!(matches!(config.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn test_policy_termination() {
        let policy = LoopPolicy::default();
        assert!(policy.accepts(0.7, 0));
        assert!(!policy.accepts(0.69, 0));
        assert!(!policy.accepts(0.0, 1));
        assert!(policy.accepts(0.0, 2));
    }

    #[test]
    fn test_policy_validation() {
        let policy = LoopPolicy {
            quality_threshold: 1.5,
            ..LoopPolicy::default()
        };
        assert!(policy.validate().is_err());
        assert!(LoopPolicy::default().validate().is_ok());
    }
}
