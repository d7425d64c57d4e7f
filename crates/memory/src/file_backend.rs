//! File-based memory store: persistent JSON-lines storage.
//!
//! Each line holds one record, its namespace and its field vectors, so a
//! restart does not need to re-embed anything. Everything is loaded on
//! creation; the file is rewritten after every put.
//!
//! Default location: `~/.blitzcoder/memory/memories.jsonl`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use blitzcoder_core::error::MemoryError;
use blitzcoder_core::memory::{Embedder, MemoryField, MemoryRecord, MemoryStore, Namespace, ScoredRecord};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::index::{NamespaceIndex, StoredRecord, embed_fields, embed_query};

pub struct FileStore {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
    index: Arc<RwLock<NamespaceIndex>>,
}

impl FileStore {
    /// Open (or start) a store at `path`.
    ///
    /// Corrupted lines and lines whose vectors don't fit the namespace are
    /// skipped with a warning.
    pub fn open(path: PathBuf, embedder: Arc<dyn Embedder>, cap: Option<usize>) -> Self {
        let mut index = NamespaceIndex::new(cap);
        let mut loaded = 0usize;
        for stored in Self::load_from_disk(&path) {
            match index.insert(stored) {
                Ok(_) => loaded += 1,
                Err(e) => warn!(error = %e, "Skipping memory record"),
            }
        }
        debug!(path = %path.display(), count = loaded, "File memory store loaded");
        Self {
            path,
            embedder,
            index: Arc::new(RwLock::new(index)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Vec<StoredRecord> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(), // not written yet
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<StoredRecord>(line) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted memory entry");
                    None
                }
            })
            .collect()
    }

    fn flush(&self, index: &NamespaceIndex) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for stored in index.iter() {
            let line = serde_json::to_string(stored).map_err(|e| {
                MemoryError::Storage(format!("Failed to serialize memory record: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))
    }
}

#[async_trait]
impl MemoryStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn put(
        &self,
        namespace: &Namespace,
        record: MemoryRecord,
        fields: &[MemoryField],
    ) -> Result<String, MemoryError> {
        let vectors = embed_fields(self.embedder.as_ref(), &record, fields).await?;
        let id = record.id.clone();
        let mut index = self.index.write().await;
        // The live index only changes once the file holds the new record.
        let mut next = index.clone();
        next.insert(StoredRecord {
            namespace: namespace.clone(),
            record,
            vectors,
        })?;
        self.flush(&next)?;
        *index = next;
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
