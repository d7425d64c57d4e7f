//! Memory augmentation of the user's question and the per-turn memory record.

use blitzcoder_core::memory::{MemoryRecord, ScoredRecord};

/// Context tag given to turn summaries.
pub const CONVERSATION_CONTEXT: &str = "conversation";

/// Rewrite `query` with recalled memories in front of it.
///
/// Returns `None` when nothing was recalled, so the question goes out as typed.
pub fn augment_query(memories: &[ScoredRecord], query: &str) -> Option<String> {
    if memories.is_empty() {
        return None;
    }
    let context = memories
        .iter()
        .map(|m| format!("Previous context: {}", m.record.memory))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!(
        "Based on our previous conversations:\n{context}\n\n\
         Current question: {query}\n\n\
         Please respond considering our conversation history and any relevant context from previous interactions."
    ))
}

/// The first `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Summary record of one user question and the final answer to it.
pub fn turn_memory(user_query: &str, answer: &str, preview_chars: usize) -> MemoryRecord {
    let memory = format!(
        "User asked: {user_query} | Assistant responded: {}...",
        preview(answer, preview_chars)
    );
    MemoryRecord::new(memory, CONVERSATION_CONTEXT, user_query, answer)
}
