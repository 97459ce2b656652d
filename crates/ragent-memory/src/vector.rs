use std::cmp::Ordering;
use std::sync::Arc;

use ragent_core::{RagError, RagResult};
use tracing::debug;

use crate::chunk::Chunk;
use crate::embedding::EmbeddingProvider;

/// Sentinel embedded once at build time to learn the vector width.
pub const PROBE_TEXT: &str = "hello";

/// Exact flat nearest-neighbour index under squared L2 distance.
///
/// Every vector has the dimension measured by embedding [`PROBE_TEXT`] when
/// the index was built.
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// Embed every chunk, in order. Chunk positions become the indices
    /// returned by [`VectorIndex::search`].
    pub async fn build(
        embedder: Arc<dyn EmbeddingProvider>,
        chunks: &[Arc<Chunk>],
    ) -> RagResult<Self> {
        let dimension = embedder.embed(PROBE_TEXT).await?.len();
        if dimension == 0 {
            return Err(RagError::Index(format!(
                "Embedding model '{}' returned an empty probe vector",
                embedder.model_name()
            )));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Index(format!(
                "Expected {} chunk embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }
        for (position, vector) in vectors.iter().enumerate() {
            check_dimension(vector, dimension, &format!("chunk {position}"))?;
        }

        debug!(
            model = embedder.model_name(),
            dimension,
            vectors = vectors.len(),
            "Built vector index"
        );

        Ok(Self {
            embedder,
            vectors,
            dimension,
        })
    }

    /// Up to `k` chunk indices, nearest first. Equal distances keep chunk order.
    pub async fn search(&self, query: &str, k: usize) -> RagResult<Vec<usize>> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query).await?;
        check_dimension(&query_vec, self.dimension, "query")?;

        let mut distances: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, v)| (index, squared_l2(&query_vec, v)))
            .collect();
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        distances.truncate(k);

        Ok(distances.into_iter().map(|(index, _)| index).collect())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn check_dimension(vector: &[f32], expected: usize, what: &str) -> RagResult<()> {
    if vector.len() != expected {
        return Err(RagError::Index(format!(
            "Embedding dimension mismatch for {what}: expected {expected}, got {}",
            vector.len()
        )));
    }
    Ok(())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
