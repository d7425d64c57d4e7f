//! Namespace-partitioned record index shared by the store backends.

use std::collections::HashMap;

use blitzcoder_core::error::MemoryError;
use blitzcoder_core::memory::{Embedder, MemoryField, MemoryRecord, Namespace, ScoredRecord};
use serde::{Deserialize, Serialize};

use crate::vector::{best_similarity, top_k};

/// A record together with the vectors of its indexed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub namespace: Namespace,
    pub record: MemoryRecord,
    pub vectors: Vec<Vec<f32>>,
}

/// Embed the requested fields of `record`. Empty fields are skipped.
pub async fn embed_fields(
    embedder: &dyn Embedder,
    record: &MemoryRecord,
    fields: &[MemoryField],
) -> Result<Vec<Vec<f32>>, MemoryError> {
    let texts: Vec<String> = fields
        .iter()
        .map(|f| record.field(*f))
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .collect();
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let vectors = embedder.embed(&texts).await?;
    if vectors.len() != texts.len() {
        return Err(MemoryError::EmbeddingFailed(format!(
            "{} returned {} vectors for {} inputs",
            embedder.name(),
            vectors.len(),
            texts.len()
        )));
    }
    Ok(vectors)
}

/// Embed a search query into exactly one vector.
pub async fn embed_query(embedder: &dyn Embedder, query: &str) -> Result<Vec<f32>, MemoryError> {
    embedder
        .embed(&[query.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MemoryError::EmbeddingFailed(format!("{} returned no vector", embedder.name())))
}

#[derive(Default, Clone)]
struct Partition {
    dimensions: Option<usize>,
    records: Vec<StoredRecord>,
}

/// Records grouped by namespace, oldest first within each.
#[derive(Default, Clone)]
pub struct NamespaceIndex {
    partitions: HashMap<Namespace, Partition>,
    cap: Option<usize>,
}

impl NamespaceIndex {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            partitions: HashMap::new(),
            cap,
        }
    }

    /// Add a record. Returns the records evicted to honour the cap.
    pub fn insert(&mut self, stored: StoredRecord) -> Result<Vec<StoredRecord>, MemoryError> {
        let partition = self.partitions.entry(stored.namespace.clone()).or_default();

        let expected = partition
            .dimensions
            .or_else(|| stored.vectors.first().map(Vec::len));
        if let Some(expected) = expected {
            if let Some(bad) = stored.vectors.iter().find(|v| v.len() != expected) {
                return Err(MemoryError::DimensionMismatch {
                    expected,
                    got: bad.len(),
                });
            }
            partition.dimensions = Some(expected);
        }

        partition.records.push(stored);

        let mut evicted = Vec::new();
        if let Some(cap) = self.cap
            && partition.records.len() > cap
        {
            let excess = partition.records.len() - cap;
            evicted.extend(partition.records.drain(..excess));
        }
        Ok(evicted)
    }

    /// Rank the records of `namespace` against an embedded query.
    pub fn search(
        &self,
        namespace: &Namespace,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        let Some(partition) = self.partitions.get(namespace) else {
            return Ok(Vec::new());
        };
        if let Some(expected) = partition.dimensions
            && expected != query.len()
        {
            return Err(MemoryError::DimensionMismatch {
                expected,
                got: query.len(),
            });
        }

        let scores: Vec<f32> = partition
            .records
            .iter()
            .map(|s| best_similarity(&s.vectors, query))
            .collect();

        Ok(top_k(&scores, limit)
            .into_iter()
            .map(|i| ScoredRecord {
                record: partition.records[i].record.clone(),
                score: scores[i],
            })
            .collect())
    }

    pub fn count(&self, namespace: &Namespace) -> usize {
        self.partitions
            .get(namespace)
            .map_or(0, |p| p.records.len())
    }

    /// Every stored record, grouped by namespace.
    pub fn iter(&self) -> impl Iterator<Item = &StoredRecord> {
        self.partitions.values().flat_map(|p| p.records.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(user: &str, memory: &str, vectors: Vec<Vec<f32>>) -> StoredRecord {
        StoredRecord {
            namespace: Namespace::memories(user),
            record: MemoryRecord::new(memory, "conversation", memory, ""),
            vectors,
        }
    }

    #[test]
    fn dimension_is_fixed_by_first_write() {
        let mut index = NamespaceIndex::default();
        index.insert(stored("a", "one", vec![vec![1.0, 0.0]])).unwrap();
        let err = index
            .insert(stored("a", "two", vec![vec![1.0, 0.0, 0.0]]))
            .unwrap_err();
        assert!(matches!(err, MemoryError::DimensionMismatch { expected: 2, got: 3 }));

        // A different namespace starts fresh.
        index.insert(stored("b", "three", vec![vec![1.0, 0.0, 0.0]])).unwrap();
    }

    #[test]
    fn query_dimension_checked() {
        let mut index = NamespaceIndex::default();
        index.insert(stored("a", "one", vec![vec![1.0, 0.0]])).unwrap();
        assert!(index.search(&Namespace::memories("a"), &[1.0], 5).is_err());
    }

    #[test]
    fn cap_evicts_oldest() {
        let mut index = NamespaceIndex::new(Some(2));
        index.insert(stored("a", "first", vec![vec![1.0]])).unwrap();
        index.insert(stored("a", "second", vec![vec![1.0]])).unwrap();
        let evicted = index.insert(stored("a", "third", vec![vec![1.0]])).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].record.memory, "first");
        assert_eq!(index.count(&Namespace::memories("a")), 2);
    }

    #[test]
    fn search_ranks_within_namespace() {
        let mut index = NamespaceIndex::default();
        index.insert(stored("a", "far", vec![vec![0.0, 1.0]])).unwrap();
        index.insert(stored("a", "near", vec![vec![1.0, 0.1]])).unwrap();
        index.insert(stored("b", "other", vec![vec![1.0, 0.0]])).unwrap();

        let hits = index.search(&Namespace::memories("a"), &[1.0, 0.0], 10).unwrap();
        let names: Vec<_> = hits.iter().map(|h| h.record.memory.as_str()).collect();
        assert_eq!(names, vec!["near", "far"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn unknown_namespace_is_empty() {
        let index = NamespaceIndex::default();
        assert!(index.search(&Namespace::memories("x"), &[1.0], 5).unwrap().is_empty());
        assert_eq!(index.count(&Namespace::memories("x")), 0);
    }
}
