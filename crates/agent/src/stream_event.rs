//! Agent-level streaming events.
//!
//! The graph reports progress through an optional channel so a front end can
//! print output while the turn is still running.

use blitzcoder_core::provider::Usage;
use serde::{Deserialize, Serialize};

/// Events emitted while a turn runs.
///
/// - `memory_recalled` : memories were prepended to the question
/// - `chunk`           : assistant text
/// - `tool_call`       : agent is invoking a tool
/// - `tool_result`     : tool execution completed
/// - `memory_stored`   : the turn summary was written
/// - `done`            : turn is complete
/// - `error`           : the turn failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    MemoryRecalled { count: usize },

    Chunk { content: String },

    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    MemoryStored { id: String },

    Done {
        thread_id: String,
        usage: Option<Usage>,
        model_calls: usize,
        tool_calls: usize,
    },

    Error { message: String },
}

impl AgentStreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MemoryRecalled { .. } => "memory_recalled",
            Self::Chunk { .. } => "chunk",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::MemoryStored { .. } => "memory_stored",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this is the last event of a turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
