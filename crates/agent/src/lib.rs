//! The BlitzCoder agent: a small orchestration graph around a completion
//! service, a tool registry, and per-user semantic memory.
//!
//! Each user turn runs **RetrieveContext → ModelCall ⇄ Tools → Finalize**:
//!
//! 1. Recall related memories and fold them into the question
//! 2. Ask the model, offering every registered tool
//! 3. While the model asks for tools, run them and ask again
//! 4. Store a short summary of the exchange as a new memory
//!
//! The model-call cycle is bounded by a per-turn recursion limit.

pub mod context;
pub mod driver;
pub mod graph;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use context::{CONVERSATION_CONTEXT, augment_query, turn_memory};
pub use driver::{DriverInput, format_search_results};
pub use graph::{AgentGraph, DEFAULT_SYSTEM_PROMPT, GraphNode, TurnOutcome};
pub use stream_event::AgentStreamEvent;
