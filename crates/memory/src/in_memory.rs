//! In-memory store: records live for the lifetime of the process.

use std::sync::Arc;

use async_trait::async_trait;
use blitzcoder_core::error::MemoryError;
use blitzcoder_core::memory::{Embedder, MemoryField, MemoryRecord, MemoryStore, Namespace, ScoredRecord};
use tokio::sync::RwLock;
use tracing::debug;

use crate::index::{NamespaceIndex, StoredRecord, embed_fields, embed_query};

pub struct InMemoryStore {
    embedder: Arc<dyn Embedder>,
    index: Arc<RwLock<NamespaceIndex>>,
}

impl InMemoryStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_capacity(embedder, None)
    }

    /// Keep at most `cap` records per namespace, evicting the oldest.
    pub fn with_capacity(embedder: Arc<dyn Embedder>, cap: Option<usize>) -> Self {
        Self {
            embedder,
            index: Arc::new(RwLock::new(NamespaceIndex::new(cap))),
        }
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn put(
        &self,
        namespace: &Namespace,
        record: MemoryRecord,
        fields: &[MemoryField],
    ) -> Result<String, MemoryError> {
        // Embed before taking the lock so searches aren't blocked on the network.
        let vectors = embed_fields(self.embedder.as_ref(), &record, fields).await?;
        let id = record.id.clone();
        let evicted = self.index.write().await.insert(StoredRecord {
            namespace: namespace.clone(),
            record,
            vectors,
        })?;
        if !evicted.is_empty() {
            debug!(namespace = %namespace, evicted = evicted.len(), "Evicted oldest memories");
        }
        Ok(id)
    }

    async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        if limit == 0 || self.index.read().await.count(namespace) == 0 {
            return Ok(Vec::new());
        }
        let q = embed_query(self.embedder.as_ref(), query).await?;
        self.index.read().await.search(namespace, &q, limit)
    }

    async fn count(&self, namespace: &Namespace) -> Result<usize, MemoryError> {
        Ok(self.index.read().await.count(namespace))
    }
}
