//! Interpreting lines typed at the chat prompt.

use std::fmt::Write as _;

use blitzcoder_core::memory::ScoredRecord;

const SEARCH_PREFIX: &str = "search:";

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverInput {
    /// Blank line; prompt again.
    Empty,
    /// `bye` or `exit`, any case.
    Exit,
    /// `search:<query>`: look through memory directly without a model call.
    Search(String),
    /// Anything else is a question for the agent.
    Turn(String),
}

impl DriverInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if line.eq_ignore_ascii_case("bye") || line.eq_ignore_ascii_case("exit") {
            return Self::Exit;
        }
        if let Some(query) = line.strip_prefix(SEARCH_PREFIX) {
            return Self::Search(query.trim().to_string());
        }
        Self::Turn(line.to_string())
    }
}

/// Render search hits for the terminal.
pub fn format_search_results(query: &str, results: &[ScoredRecord]) -> String {
    let mut out = format!("Found {} relevant memories for query: '{query}'\n", results.len());
    for (i, hit) in results.iter().enumerate() {
        let _ = write!(
            out,
            "\nMemory {}:\nContent: {}\nContext: {}\nCreated: {}\n",
            i + 1,
            hit.record.memory,
            hit.record.context,
            hit.record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use blitzcoder_core::memory::MemoryRecord;

    #[test]
    fn classifies_lines() {
        assert_eq!(DriverInput::parse("   "), DriverInput::Empty);
        assert_eq!(DriverInput::parse("BYE"), DriverInput::Exit);
        assert_eq!(DriverInput::parse("  exit \n"), DriverInput::Exit);
        assert_eq!(
            DriverInput::parse("search:  rust tips "),
            DriverInput::Search("rust tips".into())
        );
        assert_eq!(DriverInput::parse("search:"), DriverInput::Search(String::new()));
        assert_eq!(
            DriverInput::parse("exit the loop please"),
            DriverInput::Turn("exit the loop please".into())
        );
        assert_eq!(DriverInput::parse("list files"), DriverInput::Turn("list files".into()));
    }

    #[test]
    fn search_results_layout() {
        let hit = ScoredRecord {
            record: MemoryRecord::new("User asked: a | Assistant responded: b...", "conversation", "a", "b"),
            score: 0.9,
        };
        let text = format_search_results("a", &[hit]);
        assert!(text.starts_with("Found 1 relevant memories for query: 'a'\n"));
        assert!(text.contains("\nMemory 1:\nContent: User asked: a | Assistant responded: b...\nContext: conversation\nCreated: "));
    }

    #[test]
    fn empty_search_results() {
        assert_eq!(
            format_search_results("nothing", &[]),
            "Found 0 relevant memories for query: 'nothing'\n"
        );
    }
}
