use std::collections::HashSet;
use std::sync::Arc;

use ragent_core::RagResult;
use serde::Serialize;
use tracing::debug;

use crate::bm25::Bm25Index;
use crate::chunk::Chunk;
use crate::embedding::EmbeddingProvider;
use crate::vector::VectorIndex;

/// Number of hits requested when the caller does not say.
pub const DEFAULT_TOP_K: usize = 5;

/// Leading characters of a chunk used as its dedup key.
pub const FINGERPRINT_CHARS: usize = 200;

/// One entry of a retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit {
    pub chunk: Arc<Chunk>,
    /// 1-based label shown to the user as `[n]`.
    pub citation: usize,
}

/// Lexical + dense retriever bound to one knowledge base.
///
/// Both indices share the same `Arc<Chunk>`s. Results are merged by order
/// alone:
///
/// 1. BM25 top-k, then vector top-k
/// 2. drop any chunk whose first [`FINGERPRINT_CHARS`] characters were seen
/// 3. keep the first k, label them 1..n
pub struct HybridRetriever {
    chunks: Vec<Arc<Chunk>>,
    lexical: Bm25Index,
    vector: VectorIndex,
}

impl HybridRetriever {
    /// Index the chunks with both methods.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> RagResult<Self> {
        let chunks: Vec<Arc<Chunk>> = chunks.into_iter().map(Arc::new).collect();
        let lexical = Bm25Index::build(&chunks);
        let vector = VectorIndex::build(embedder, &chunks).await?;
        Ok(Self {
            chunks,
            lexical,
            vector,
        })
    }

    /// Retrieve at most `k` distinct chunks for `query`.
    ///
    /// An empty knowledge base yields an empty result without touching the
    /// embedding capability.
    pub async fn retrieve(&self, query: &str, k: usize) -> RagResult<Vec<RetrievalHit>> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let lexical = self.lexical.top_k(query, k);
        let dense = self.vector.search(query, k).await?;
        let hits = merge(&self.chunks, &lexical, &dense, k);

        debug!(
            lexical = lexical.len(),
            dense = dense.len(),
            kept = hits.len(),
            k,
            "Hybrid retrieval"
        );
        Ok(hits)
    }

    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Concatenate lexical then dense candidates, dedup by fingerprint in
/// encounter order, truncate to `k` and label.
pub fn merge(
    chunks: &[Arc<Chunk>],
    lexical: &[usize],
    dense: &[usize],
    k: usize,
) -> Vec<RetrievalHit> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut hits = Vec::with_capacity(k);

    for &index in lexical.iter().chain(dense) {
        if hits.len() == k {
            break;
        }
        let Some(chunk) = chunks.get(index) else {
            continue;
        };
        if !seen.insert(fingerprint(&chunk.text)) {
            continue;
        }
        hits.push(RetrievalHit {
            chunk: Arc::clone(chunk),
            citation: hits.len() + 1,
        });
    }
    hits
}

/// The dedup key: the first [`FINGERPRINT_CHARS`] characters of the text.
pub fn fingerprint(text: &str) -> String {
    text.chars().take(FINGERPRINT_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::embedding::LocalEmbedding;

    fn arc_chunks(texts: &[&str]) -> Vec<Arc<Chunk>> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                Arc::new(Chunk {
                    text: text.to_string(),
                    source: format!("doc{i}"),
                    sequence_index: i,
                })
            })
            .collect()
    }

    #[test]
    fn test_lexical_results_come_first() {
        let chunks = arc_chunks(&["a", "b", "c", "d"]);
        let hits = merge(&chunks, &[2, 0], &[1, 3], 4);
        let order: Vec<usize> = hits.iter().map(|h| h.chunk.sequence_index).collect();
        assert_eq!(order, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_overlap_between_methods_deduplicated() {
        let chunks = arc_chunks(&["a", "b", "c"]);
        let hits = merge(&chunks, &[0, 1], &[1, 2], 5);
        let order: Vec<usize> = hits.iter().map(|h| h.chunk.sequence_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_same_prefix_counts_as_duplicate() {
        let shared = "x".repeat(FINGERPRINT_CHARS);
        let first = format!("{shared} first ending");
        let second = format!("{shared} second ending");
        let chunks = arc_chunks(&[&first, &second, "other"]);

        let hits = merge(&chunks, &[0, 1], &[2], 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.sequence_index, 0);
        assert_eq!(hits[1].chunk.sequence_index, 2);
    }

    #[test]
    fn test_truncated_to_k_with_contiguous_labels() {
        let chunks = arc_chunks(&["a", "b", "c", "d", "e", "f"]);
        let hits = merge(&chunks, &[0, 1, 2], &[3, 4, 5], 3);
        assert_eq!(hits.len(), 3);
        let labels: Vec<usize> = hits.iter().map(|h| h.citation).collect();
        assert_eq!(labels, vec![1, 2, 3]);
    }

    #[test]
    fn test_fingerprint_counts_chars() {
        let text = "é".repeat(FINGERPRINT_CHARS + 10);
        assert_eq!(fingerprint(&text).chars().count(), FINGERPRINT_CHARS);
        assert_eq!(fingerprint("short"), "short");
    }

    #[tokio::test]
    async fn test_retrieve_finds_relevant_chunk() {
        let chunks = vec![
            Chunk {
                text: "The borrow checker enforces ownership rules in Rust".to_string(),
                source: "rust.txt".to_string(),
                sequence_index: 0,
            },
            Chunk {
                text: "Sourdough bread needs a mature starter".to_string(),
                source: "bread.txt".to_string(),
                sequence_index: 1,
            },
            Chunk {
                text: "Tomatoes grow well in a warm summer".to_string(),
                source: "garden.txt".to_string(),
                sequence_index: 2,
            },
        ];
        let retriever = HybridRetriever::build(chunks, Arc::new(LocalEmbedding::new(64)))
            .await
            .unwrap();

        let hits = retriever.retrieve("borrow checker", 5).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.source, "rust.txt");
        assert_eq!(hits[0].citation, 1);
    }

    #[tokio::test]
    async fn test_retrieve_on_empty_corpus() {
        let retriever = HybridRetriever::build(Vec::new(), Arc::new(LocalEmbedding::default()))
            .await
            .unwrap();
        assert!(retriever.is_empty());
        assert!(retriever.retrieve("hello", DEFAULT_TOP_K).await.unwrap().is_empty());
    }
}
