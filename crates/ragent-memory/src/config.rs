use ragent_core::{RagError, RagResult};
use serde::{Deserialize, Serialize};

/// Chunk window parameters, in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl ChunkingConfig {
    /// Reject windows that cannot make progress.
    pub fn validate(&self) -> RagResult<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunking.chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// How many hits a retrieval returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    crate::hybrid::DEFAULT_TOP_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> RagResult<()> {
        if self.top_k == 0 {
            return Err(RagError::Config("retrieval.top_k must be >= 1".into()));
        }
        Ok(())
    }
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// A local Ollama server (`/api/embed`).
    Ollama,
    /// Hashed bag-of-words; no network.
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_backend")]
    pub provider: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_url")]
    pub base_url: String,
    /// Vector width of the local provider. Remote providers are probed instead.
    #[serde(default = "default_local_dimension")]
    pub dimension: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend() -> EmbeddingBackend {
    EmbeddingBackend::Ollama
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_local_dimension() -> usize {
    256
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_backend(),
            model: default_embedding_model(),
            base_url: default_embedding_url(),
            dimension: default_local_dimension(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> RagResult<()> {
        if self.provider == EmbeddingBackend::Local && self.dimension == 0 {
            return Err(RagError::Config(
                "embedding.dimension must be > 0 for the local provider".into(),
            ));
        }
        if self.provider == EmbeddingBackend::Ollama && self.model.trim().is_empty() {
            return Err(RagError::Config("embedding.model must be set".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        };
        assert!(matches!(config.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        assert!(RetrievalConfig { top_k: 0 }.validate().is_err());
        assert_eq!(RetrievalConfig::default().top_k, 5);
    }

    #[test]
    fn test_embedding_config_deserialize_partial() {
        let config: EmbeddingConfig = serde_json::from_str(r#"{"provider": "local"}"#).unwrap();
        assert_eq!(config.provider, EmbeddingBackend::Local);
        assert_eq!(config.dimension, 256);
        assert_eq!(config.model, "nomic-embed-text");
    }
}
