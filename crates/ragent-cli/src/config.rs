use std::path::Path;
use std::time::Duration;

use ragent_agent::{LoopPolicy, ModelConfig, DEFAULT_HISTORY_TURNS};
use ragent_core::{RagError, RagResult};
use ragent_memory::knowledge::DEFAULT_MAX_IDLE;
use ragent_memory::{ChunkingConfig, EmbeddingConfig, RetrievalConfig};
use ragent_tools::{WebSearchConfig, MAX_TOOL_OUTPUT_CHARS};
use serde::Deserialize;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "RAGENT_API_KEY";

/// Config file read when `--config` is not given; missing is fine.
pub const DEFAULT_CONFIG_PATH: &str = "ragent.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RagentConfig {
    pub model: ModelConfig,
    /// Falls back to `model` with temperature 0.
    pub evaluator: Option<ModelConfig>,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub agent: AgentSettings,
    pub web_search: WebSearchConfig,
    pub knowledge: KnowledgeSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    #[serde(flatten)]
    pub policy: LoopPolicy,
    /// Conversation messages passed to each run in `chat`.
    pub history_turns: usize,
    pub max_tool_output_chars: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            policy: LoopPolicy::default(),
            history_turns: DEFAULT_HISTORY_TURNS,
            max_tool_output_chars: MAX_TOOL_OUTPUT_CHARS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    pub max_idle_secs: u64,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            max_idle_secs: DEFAULT_MAX_IDLE.as_secs(),
        }
    }
}

impl KnowledgeSettings {
    pub fn max_idle(&self) -> Duration {
        Duration::from_secs(self.max_idle_secs)
    }
}

impl RagentConfig {
    pub fn evaluator(&self) -> ModelConfig {
        self.evaluator
            .clone()
            .unwrap_or_else(|| self.model.for_evaluation())
    }

    /// Fill empty API keys from `key`.
    pub fn apply_api_key(&mut self, key: Option<String>) {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return;
        };
        if self.model.api_key.is_empty() {
            self.model.api_key = key.clone();
        }
        if let Some(evaluator) = &mut self.evaluator {
            if evaluator.api_key.is_empty() {
                evaluator.api_key = key;
            }
        }
    }

    pub fn validate(&self) -> RagResult<()> {
        self.model.validate()?;
        self.evaluator().validate()?;
        self.embedding.validate()?;
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.agent.policy.validate()?;
        self.web_search.validate()?;
        if self.agent.history_turns == 0 {
            return Err(RagError::Config(
                "agent.history_turns must be at least 1".to_string(),
            ));
        }
        if self.agent.max_tool_output_chars == 0 {
            return Err(RagError::Config(
                "agent.max_tool_output_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse TOML text into a config; no environment, no validation.
pub fn parse_config(text: &str) -> RagResult<RagentConfig> {
    toml::from_str(text).map_err(|e| RagError::Config(format!("Invalid config: {e}")))
}

/// Load, apply the API key from the environment, and validate.
///
/// With `path == None` the default file is read if present, otherwise
/// defaults apply. An explicit path must exist.
pub async fn load_config(path: Option<&Path>) -> RagResult<RagentConfig> {
    let mut config = match path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                RagError::Config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            })?;
            parse_config(&text)?
        }
        None => match tokio::fs::read_to_string(DEFAULT_CONFIG_PATH).await {
            Ok(text) => parse_config(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RagentConfig::default(),
            Err(e) => return Err(e.into()),
        },
    };
    config.apply_api_key(std::env::var(API_KEY_ENV).ok());
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ragent_agent::LlmProvider;
    use ragent_memory::config::EmbeddingBackend;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.chunking, ChunkingConfig::default());
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.agent.policy, LoopPolicy::default());
        assert_eq!(config.agent.history_turns, 6);
        assert_eq!(config.knowledge.max_idle(), Duration::from_secs(1800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_evaluator_defaults_to_model_at_zero_temperature() {
        let config = parse_config("[model]\nmodel_id = \"llama3.2\"\ntemperature = 0.5\n").unwrap();
        let evaluator = config.evaluator();
        assert_eq!(evaluator.model_id, "llama3.2");
        assert_eq!(evaluator.temperature, 0.0);
        assert_eq!(config.model.temperature, 0.5);
    }

    #[test]
    fn test_full_file() {
        let config = parse_config(
            r#"
[model]
provider = "groq"
model_id = "llama-3.1-8b-instant"
api_key = "gsk_test"

[evaluator]
provider = "ollama"
model_id = "ministral-3:3b"
temperature = 0.0

[embedding]
provider = "local"
dimension = 128

[chunking]
chunk_size = 500
chunk_overlap = 50

[retrieval]
top_k = 3

[agent]
quality_threshold = 0.8
max_retries = 1
refine_with_context = true
history_turns = 4

[web_search]
max_results = 3

[knowledge]
max_idle_secs = 60
"#,
        )
        .unwrap();

        assert_eq!(config.model.provider, LlmProvider::Groq);
        assert_eq!(config.evaluator().provider, LlmProvider::Ollama);
        assert_eq!(config.embedding.provider, EmbeddingBackend::Local);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.agent.policy.quality_threshold, 0.8);
        assert_eq!(config.agent.policy.max_retries, 1);
        assert!(config.agent.policy.refine_with_context);
        assert_eq!(config.agent.policy.max_reason_turns, 20);
        assert_eq!(config.agent.history_turns, 4);
        assert_eq!(config.web_search.max_results, 3);
        assert_eq!(config.knowledge.max_idle_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_not_smaller_than_size_rejected() {
        let config = parse_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();
        assert!(matches!(config.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = parse_config("[agent]\nquality_threshold = 1.2\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let config = parse_config("[retrieval]\ntop_k = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        assert!(matches!(parse_config("[model"), Err(RagError::Config(_))));
    }

    #[test]
    fn test_api_key_fills_only_empty_slots() {
        let mut config = parse_config(
            "[model]\nprovider = \"openai\"\n[evaluator]\nprovider = \"openai\"\napi_key = \"own\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        config.apply_api_key(Some("from-env".to_string()));
        assert_eq!(config.model.api_key, "from-env");
        assert_eq!(config.evaluator().api_key, "own");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]\ntop_k = 7").unwrap();
        let config = load_config(Some(file.path())).await.unwrap();
        assert_eq!(config.retrieval.top_k, 7);
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).await.unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }
}
