//! Local document memory: chunking, lexical and semantic indices, and the
//! hybrid retriever that merges them.
//!
//! A knowledge base is built once from ingested text and is read-only
//! afterwards, apart from its last-used timestamp.
//!
//! # Main types
//!
//! - [`Chunker`]: Recursive character splitter with overlapping windows.
//! - [`Bm25Index`]: Okapi BM25 scoring over all chunks.
//! - [`EmbeddingProvider`]: Trait for the embedding capability.
//! - [`VectorIndex`]: Exact L2 nearest-neighbour search over chunk embeddings.
//! - [`HybridRetriever`]: Lexical-first merge of both indices with citation labels.
//! - [`KnowledgeBaseStore`]: Owns knowledge bases; callers hold [`KbId`] handles.

/// BM25 lexical index.
pub mod bm25;
/// Text chunking.
pub mod chunk;
/// Chunking, embedding, and retrieval configuration.
pub mod config;
/// Embedding provider trait and implementations.
pub mod embedding;
/// Hybrid retrieval.
pub mod hybrid;
/// Knowledge bases and their store.
pub mod knowledge;
/// Vector index.
pub mod vector;

pub use bm25::Bm25Index;
pub use chunk::{Chunk, Chunker, TextBlock};
pub use config::{ChunkingConfig, EmbeddingConfig, RetrievalConfig};
pub use embedding::{create_provider, EmbeddingProvider, LocalEmbedding, OllamaEmbedding};
pub use hybrid::{HybridRetriever, RetrievalHit};
pub use knowledge::{KbId, KnowledgeBase, KnowledgeBaseStore};
pub use vector::VectorIndex;
