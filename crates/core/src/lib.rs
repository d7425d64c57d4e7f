//! # BlitzCoder Core
//!
//! Domain types, traits, and error definitions for the BlitzCoder coding
//! agent. Every subsystem is defined as a trait here; implementations live in
//! their respective crates, and all crates depend inward on this one.

pub mod checkpoint;
pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod schema;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use checkpoint::Checkpointer;
pub use error::{AgentError, Error, MemoryError, ProviderError, Result, ToolError};
pub use memory::{Embedder, MemoryField, MemoryRecord, MemoryStore, Namespace, ScoredRecord};
pub use message::{Message, MessageToolCall, Role, Session, ThreadId};
pub use provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, ToolDefinition, Usage,
};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
