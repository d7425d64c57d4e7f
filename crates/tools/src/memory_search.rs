//! Memory search tool: lets the agent look up its own long-term memory on demand.

use std::sync::Arc;

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::memory::{MemoryStore, Namespace};
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_LIMIT: usize = 50;

/// Searches one namespace, normally the current user's `memories`.
pub struct MemorySearchTool {
    store: Arc<dyn MemoryStore>,
    namespace: Namespace,
}

impl MemorySearchTool {
    pub fn new(store: Arc<dyn MemoryStore>, namespace: Namespace) -> Self {
        Self { store, namespace }
    }
}

#[derive(Deserialize)]
struct Args {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct MemoryHit {
    id: String,
    memory: String,
    context: String,
    score: f32,
    created_at: String,
}

#[async_trait]
impl Tool for MemorySearchTool {
    fn name(&self) -> &str {
        "memory_search"
    }

    fn description(&self) -> &str {
        "Search your long-term memory of past conversations with this user. \
         Use this when you need to recall something discussed before."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_LIMIT,
                    "description": "Maximum number of memories to return (default 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let limit = args.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let scored = self
            .store
            .search(&self.namespace, &args.query, limit)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("memory search failed: {e}")))?;

        let hits: Vec<MemoryHit> = scored
            .into_iter()
            .map(|s| MemoryHit {
                id: s.record.id,
                memory: s.record.memory,
                context: s.record.context,
                score: s.score,
                created_at: s.record.created_at.to_rfc3339(),
            })
            .collect();

        if hits.is_empty() {
            return Ok(ToolResult::ok(format!("No memories found matching '{}'.", args.query)));
        }

        let data = serde_json::to_value(&hits).map_err(|e| ToolError::failed(self.name(), e))?;
        let output = serde_json::to_string_pretty(&data).map_err(|e| ToolError::failed(self.name(), e))?;
        Ok(ToolResult::ok(output).with_data(data))
    }
}
