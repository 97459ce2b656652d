use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use ragent_core::{RagError, RagResult};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chunk::{Chunker, TextBlock};
use crate::config::ChunkingConfig;
use crate::embedding::EmbeddingProvider;
use crate::hybrid::{HybridRetriever, RetrievalHit};

/// Handle to a knowledge base held by a [`KnowledgeBaseStore`].
pub type KbId = Uuid;

/// Idle time after which [`KnowledgeBaseStore::sweep_idle`] drops a knowledge base.
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(30 * 60);

/// The indexed chunks of one ingested source, with its retriever.
///
/// Read-only after construction except for `last_used`.
pub struct KnowledgeBase {
    id: KbId,
    retriever: HybridRetriever,
    source_description: String,
    created_at: DateTime<Utc>,
    /// Milliseconds since the Unix epoch.
    last_used: AtomicI64,
}

impl KnowledgeBase {
    /// Chunk the blocks and build both indices.
    pub async fn build(
        blocks: &[TextBlock],
        source_description: impl Into<String>,
        chunking: &ChunkingConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> RagResult<Self> {
        let chunks = Chunker::new(chunking.clone())?.split_blocks(blocks);
        let retriever = HybridRetriever::build(chunks, embedder).await?;
        Ok(Self::from_retriever(retriever, source_description))
    }

    /// Wrap an already built retriever under a fresh id.
    pub fn from_retriever(retriever: HybridRetriever, source_description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            retriever,
            source_description: source_description.into(),
            created_at: now,
            last_used: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn id(&self) -> KbId {
        self.id
    }

    pub fn retriever(&self) -> &HybridRetriever {
        &self.retriever
    }

    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_used(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_used.load(Ordering::Relaxed))
            .single()
            .unwrap_or(self.created_at)
    }

    /// Record a use at `now`.
    pub fn touch(&self, now: DateTime<Utc>) {
        self.last_used
            .store(now.timestamp_millis(), Ordering::Relaxed);
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        let idle_ms = now.timestamp_millis() - self.last_used.load(Ordering::Relaxed);
        Duration::from_millis(u64::try_from(idle_ms).unwrap_or(0))
    }

    fn rebind(mut self, id: KbId) -> Self {
        self.id = id;
        self
    }
}

/// Owner of every live knowledge base.
///
/// Callers keep [`KbId`]s, never references. A rebuilt base is swapped in
/// whole with [`KnowledgeBaseStore::replace`]; readers see either the old
/// or the new one.
#[derive(Default)]
pub struct KnowledgeBaseStore {
    bases: RwLock<HashMap<KbId, Arc<KnowledgeBase>>>,
}

impl KnowledgeBaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a base and return its handle.
    pub fn insert(&self, kb: KnowledgeBase) -> KbId {
        let id = kb.id();
        info!(
            kb = %id,
            chunks = kb.retriever().len(),
            source = kb.source_description(),
            "Knowledge base ready"
        );
        self.bases.write().insert(id, Arc::new(kb));
        id
    }

    /// Build a base from ingested blocks and insert it.
    pub async fn build(
        &self,
        blocks: &[TextBlock],
        source_description: impl Into<String>,
        chunking: &ChunkingConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> RagResult<KbId> {
        let kb = KnowledgeBase::build(blocks, source_description, chunking, embedder).await?;
        Ok(self.insert(kb))
    }

    /// Retrieve from one base and mark it used.
    pub async fn retrieve(&self, id: KbId, query: &str, k: usize) -> RagResult<Vec<RetrievalHit>> {
        let kb = self.get(id)?;
        kb.touch(Utc::now());
        kb.retriever().retrieve(query, k).await
    }

    pub fn source_description(&self, id: KbId) -> RagResult<String> {
        Ok(self.get(id)?.source_description().to_string())
    }

    pub fn chunk_count(&self, id: KbId) -> RagResult<usize> {
        Ok(self.get(id)?.retriever().len())
    }

    /// Swap in a rebuilt base under an existing handle.
    pub fn replace(&self, id: KbId, kb: KnowledgeBase) -> RagResult<()> {
        let mut bases = self.bases.write();
        match bases.get_mut(&id) {
            Some(slot) => {
                *slot = Arc::new(kb.rebind(id));
                debug!(kb = %id, "Replaced knowledge base");
                Ok(())
            }
            None => Err(unknown(id)),
        }
    }

    /// Drop a base. Returns whether it existed.
    pub fn remove(&self, id: KbId) -> bool {
        self.bases.write().remove(&id).is_some()
    }

    pub fn ids(&self) -> Vec<KbId> {
        self.bases.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bases.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.read().is_empty()
    }

    /// Remove every base idle for longer than `max_idle` at `now`.
    ///
    /// Runs only when called; returns the removed handles.
    pub fn sweep_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> Vec<KbId> {
        let mut bases = self.bases.write();
        let expired: Vec<KbId> = bases
            .iter()
            .filter(|(_, kb)| kb.idle_for(now) > max_idle)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            bases.remove(id);
            info!(kb = %id, "Removed idle knowledge base");
        }
        expired
    }

    fn get(&self, id: KbId) -> RagResult<Arc<KnowledgeBase>> {
        self.bases.read().get(&id).cloned().ok_or_else(|| unknown(id))
    }
}

fn unknown(id: KbId) -> RagError {
    RagError::KnowledgeBase(format!("Unknown knowledge base: {id}"))
}
