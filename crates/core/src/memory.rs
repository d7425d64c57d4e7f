//! Memory traits: per-user semantic memory with embedding search.
//!
//! Records live under a [`Namespace`] of `(user_id, "memories")`. Each
//! record is embedded at write time over a chosen set of fields and found
//! again by cosine similarity against an embedded query. Ranking is by
//! similarity alone; there is no recency weighting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MemoryError;

/// The collection name every user's conversational memories live under.
pub const MEMORIES: &str = "memories";

/// A partition key scoping storage and search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    pub user_id: String,
    pub collection: String,
}

impl Namespace {
    /// The `(user_id, "memories")` namespace.
    pub fn memories(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            collection: MEMORIES.to_string(),
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.user_id, self.collection)
    }
}

/// A summarized user/assistant exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,

    /// The summary text surfaced as "previous context"
    pub memory: String,

    /// Free-text tag, "conversation" for turn summaries
    pub context: String,

    pub user_query: String,

    pub ai_response: String,

    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(
        memory: impl Into<String>,
        context: impl Into<String>,
        user_query: impl Into<String>,
        ai_response: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            memory: memory.into(),
            context: context.into(),
            user_query: user_query.into(),
            ai_response: ai_response.into(),
            created_at: Utc::now(),
        }
    }

    pub fn field(&self, field: MemoryField) -> &str {
        match field {
            MemoryField::Memory => &self.memory,
            MemoryField::Context => &self.context,
            MemoryField::UserQuery => &self.user_query,
            MemoryField::AiResponse => &self.ai_response,
        }
    }
}

/// A record field that can be indexed for similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryField {
    Memory,
    Context,
    UserQuery,
    AiResponse,
}

/// The fields turn summaries are indexed over.
pub const DEFAULT_INDEX_FIELDS: [MemoryField; 3] =
    [MemoryField::Memory, MemoryField::Context, MemoryField::UserQuery];

/// A search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: MemoryRecord,
    pub score: f32,
}

/// Turns text into fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// The length of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError>;
}

/// The core MemoryStore trait.
///
/// Implementations: in-memory (process lifetime) and JSON-lines file.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// Store a record, embedding each of `fields`. Returns the record id.
    ///
    /// Embedding failures are returned as-is; no retry happens here.
    async fn put(
        &self,
        namespace: &Namespace,
        record: MemoryRecord,
        fields: &[MemoryField],
    ) -> Result<String, MemoryError>;

    /// Up to `limit` records of `namespace`, by descending similarity to
    /// `query`. An empty namespace yields an empty list.
    async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError>;

    /// Number of records in `namespace`.
    async fn count(&self, namespace: &Namespace) -> Result<usize, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memories_namespace() {
        let ns = Namespace::memories("user-1");
        assert_eq!(ns.collection, "memories");
        assert_eq!(ns.to_string(), "(user-1, memories)");
        assert_ne!(ns, Namespace::memories("user-2"));
    }

    #[test]
    fn record_fields() {
        let record = MemoryRecord::new("summary", "conversation", "What is 2+2?", "4");
        assert_eq!(record.field(MemoryField::UserQuery), "What is 2+2?");
        assert_eq!(record.field(MemoryField::Context), "conversation");
        assert!(!record.id.is_empty());
    }

    #[test]
    fn memory_field_serializes_snake_case() {
        let json = serde_json::to_string(&DEFAULT_INDEX_FIELDS).unwrap();
        assert_eq!(json, r#"["memory","context","user_query"]"#);
    }
}
