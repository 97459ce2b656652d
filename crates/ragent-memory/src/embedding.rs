use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ragent_core::{RagError, RagResult};
use tracing::debug;

use crate::config::{EmbeddingBackend, EmbeddingConfig};

/// Trait for computing text embeddings (vector representations).
///
/// Implementations must return vectors of one fixed width for every input.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding vector for a single text.
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>>;

    /// Compute embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> RagResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

/// Local bag-of-words embedding (no external API needed).
/// Hashes each word to a few positions of a fixed-size vector, weighted by
/// term frequency, then L2-normalizes.
pub struct LocalEmbedding {
    dimension: usize,
}

impl LocalEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        if self.dimension == 0 {
            return Err(RagError::Embedding(
                "Local embedding dimension must be > 0".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 1)
            .collect();

        let total = words.len() as f32;
        if total == 0.0 {
            return Ok(vector);
        }

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for word in &words {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }

        for (word, count) in &freq {
            let tf = count / total;
            let hash1 = simple_hash(word.as_bytes()) as usize;
            let hash2 = simple_hash(&[word.as_bytes(), &[1u8]].concat()) as usize;
            let hash3 = simple_hash(&[word.as_bytes(), &[2u8]].concat()) as usize;

            vector[hash1 % self.dimension] += tf;
            vector[hash2 % self.dimension] += tf * 0.7;
            vector[hash3 % self.dimension] += tf * 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "local-bow"
    }
}

/// Simple deterministic hash function (FNV-1a).
fn simple_hash(data: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Embedding provider backed by a local Ollama server.
///
/// Calls `POST {base_url}/api/embed` with `{"model", "input"}` and reads the
/// `embeddings` array. A whole batch goes out as one request.
pub struct OllamaEmbedding {
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl OllamaEmbedding {
    pub fn new(config: &EmbeddingConfig) -> RagResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::Embedding(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn request(&self, input: serde_json::Value) -> RagResult<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": input,
        });

        let resp = self.http.post(&url).json(&body).send().await.map_err(|e| {
            RagError::Embedding(format!(
                "Ollama connection error (is Ollama running at {}?): {e}",
                self.base_url
            ))
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Ollama API error {status}: {text}"
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Invalid Ollama response: {e}")))?;
        parse_ollama_response(&json)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        self.request(serde_json::json!(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> RagResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.request(serde_json::json!(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        debug!(model = %self.model, count = vectors.len(), "Embedded batch");
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> RagResult<Vec<Vec<f32>>> {
    let data = json
        .get("embeddings")
        .and_then(|d| d.as_array())
        .ok_or_else(|| {
            RagError::Embedding("Invalid Ollama response: missing embeddings array".to_string())
        })?;

    data.iter()
        .map(|item| {
            item.as_array()
                .ok_or_else(|| {
                    RagError::Embedding(
                        "Invalid Ollama response: embedding is not an array".to_string(),
                    )
                })?
                .iter()
                .map(|v| {
                    v.as_f64().map(|f| f as f32).ok_or_else(|| {
                        RagError::Embedding(
                            "Invalid Ollama response: non-numeric component".to_string(),
                        )
                    })
                })
                .collect::<RagResult<Vec<f32>>>()
        })
        .collect()
}

/// Create the configured [`EmbeddingProvider`].
pub fn create_provider(config: &EmbeddingConfig) -> RagResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::Local => Arc::new(LocalEmbedding::new(config.dimension)),
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedding::new(config)?),
    };
    Ok(provider)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            dot / (na * nb)
        }
    }

    fn ollama_config(base_url: String) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_local_embedding_dimension() {
        let emb = LocalEmbedding::new(128);
        let vec = emb.embed("hello world").await.unwrap();
        assert_eq!(vec.len(), 128);
    }

    #[tokio::test]
    async fn test_local_embedding_normalized() {
        let emb = LocalEmbedding::default();
        let vec = emb.embed("the quick brown fox jumps").await.unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_local_embedding_similar_texts() {
        let emb = LocalEmbedding::default();
        let v1 = emb.embed("rust programming language").await.unwrap();
        let v2 = emb.embed("rust programming systems").await.unwrap();
        let v3 = emb.embed("cooking recipes for dinner").await.unwrap();

        let sim_12 = cosine_similarity(&v1, &v2);
        let sim_13 = cosine_similarity(&v1, &v3);
        assert!(
            sim_12 > sim_13,
            "sim(rust-rust)={sim_12} should be > sim(rust-cooking)={sim_13}"
        );
    }

    #[tokio::test]
    async fn test_local_embedding_empty_text_is_zero_vector() {
        let emb = LocalEmbedding::new(16);
        let vec = emb.embed("").await.unwrap();
        assert_eq!(vec, vec![0.0; 16]);
    }

    #[tokio::test]
    async fn test_embed_batch_default_keeps_order() {
        let emb = LocalEmbedding::default();
        let vecs = emb.embed_batch(&["hello", "world"]).await.unwrap();
        assert_eq!(vecs.len(), 2);
        assert_eq!(vecs[0], emb.embed("hello").await.unwrap());
        assert_eq!(vecs[1], emb.embed("world").await.unwrap());
    }

    #[tokio::test]
    async fn test_ollama_batch_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(serde_json::json!({"model": "nomic-embed-text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
            })))
            .mount(&server)
            .await;

        let emb = OllamaEmbedding::new(&ollama_config(server.uri())).unwrap();
        let vecs = emb.embed_batch(&["one", "two"]).await.unwrap();
        assert_eq!(vecs.len(), 2);
        assert_eq!(vecs[1].len(), 3);
        assert!((vecs[1][0] - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_ollama_server_error_is_embedding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
            .mount(&server)
            .await;

        let emb = OllamaEmbedding::new(&ollama_config(server.uri())).unwrap();
        let err = emb.embed("hello").await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_ollama_count_mismatch_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2]]
            })))
            .mount(&server)
            .await;

        let emb = OllamaEmbedding::new(&ollama_config(server.uri())).unwrap();
        assert!(emb.embed_batch(&["a", "b"]).await.is_err());
    }

    #[test]
    fn test_parse_rejects_missing_array() {
        let err = parse_ollama_response(&serde_json::json!({"data": []})).unwrap_err();
        assert!(err.to_string().contains("missing embeddings"));
    }

    #[test]
    fn test_create_local_provider() {
        let config = EmbeddingConfig {
            provider: EmbeddingBackend::Local,
            dimension: 32,
            ..EmbeddingConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "local-bow");
    }
}
