//! error_detection: record an error the model found and point at its source.
//!
//! The report echoes the error for the path it belongs to. When the text
//! names a line (`line 12`, `app.py:12`) and the file is readable, the
//! surrounding lines are quoted as well.

use std::sync::LazyLock;

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use regex_lite::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::workspace::Workspace;

static LINE_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)\bline (\d+)").ok());
static LINE_COLON: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"([\w.\-]+):(\d+)").ok());

/// Lines quoted on each side of the reported one.
const CONTEXT_LINES: usize = 2;

pub struct ErrorDetectionTool {
    workspace: Workspace,
}

#[derive(Deserialize)]
struct Args {
    error: String,
    path: String,
}

impl ErrorDetectionTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

/// The 1-based line `error` refers to in the file called `file_name`.
fn referenced_line(error: &str, file_name: &str) -> Option<usize> {
    let by_name = LINE_COLON.as_ref().and_then(|re| {
        re.captures_iter(error)
            .find(|c| c.get(1).is_some_and(|m| m.as_str() == file_name))
            .and_then(|c| c.get(2))
    });
    let by_word = || LINE_WORD.as_ref().and_then(|re| re.captures(error)).and_then(|c| c.get(1));
    by_name
        .or_else(by_word)
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

fn excerpt(source: &str, line: usize) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    if line > lines.len() {
        return None;
    }
    let first = line.saturating_sub(CONTEXT_LINES).max(1);
    let last = (line + CONTEXT_LINES).min(lines.len());
    let width = last.to_string().len();
    let quoted = (first..=last)
        .map(|n| {
            let marker = if n == line { '>' } else { ' ' };
            format!("{marker} {n:>width$} | {}", lines[n - 1])
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(quoted)
}

#[async_trait]
impl Tool for ErrorDetectionTool {
    fn name(&self) -> &str {
        "error_detection"
    }

    fn description(&self) -> &str {
        "Report an error message or traceback for a file. Returns the error together \
         with the source lines it points to, when it names a line."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "error": { "type": "string", "description": "The error message or traceback" },
                "path": { "type": "string", "description": "File the error occurred in" }
            },
            "required": ["error", "path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        warn!(path = %args.path, error = %args.error.trim(), "Error detected");

        let mut report = format!("Error detected in {}:\n{}", args.path, args.error.trim_end());

        let resolved = self.workspace.resolve(&args.path).await;
        let file_name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let line = referenced_line(&args.error, &file_name);

        if let Some(line) = line
            && let Ok(source) = tokio::fs::read_to_string(&resolved).await
            && let Some(quoted) = excerpt(&source, line)
        {
            report.push_str(&format!("\n\nSource around line {line}:\n{quoted}"));
        }

        Ok(ToolResult::ok(report).with_data(serde_json::json!({ "line": line })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_python_and_compiler_style_lines() {
        let py = "Traceback (most recent call last):\n  File \"app.py\", line 7, in <module>\nNameError";
        assert_eq!(referenced_line(py, "app.py"), Some(7));
        let rustc = "error[E0425]: cannot find value `x`\n --> src/main.rs:3:5";
        assert_eq!(referenced_line(rustc, "main.rs"), Some(3));
        assert_eq!(referenced_line("something broke", "main.rs"), None);
    }

    #[test]
    fn excerpt_marks_the_line_and_stays_in_bounds() {
        let source = "a\nb\nc\nd\ne\nf";
        assert_eq!(excerpt(source, 1).unwrap(), "> 1 | a\n  2 | b\n  3 | c");
        assert!(excerpt(source, 4).unwrap().contains("> 4 | d"));
        assert!(excerpt(source, 40).is_none());
    }

    #[tokio::test]
    async fn report_quotes_the_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.py"), "import os\n\nprint(x)\n").unwrap();
        let tool = ErrorDetectionTool::new(Workspace::new(dir.path()));

        let result = tool
            .execute(serde_json::json!({
                "error": "File \"app.py\", line 3\nNameError: name 'x' is not defined",
                "path": "app.py"
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("Error detected in app.py:\nFile \"app.py\", line 3"));
        assert!(result.output.contains("Source around line 3:"));
        assert!(result.output.contains("> 3 | print(x)"));
        assert_eq!(result.data.unwrap()["line"], 3);
    }

    #[tokio::test]
    async fn missing_file_still_reports() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ErrorDetectionTool::new(Workspace::new(dir.path()));
        let result = tool
            .execute(serde_json::json!({"error": "boom at line 2", "path": "gone.py"}))
            .await
            .unwrap();
        assert_eq!(result.output, "Error detected in gone.py:\nboom at line 2");
    }
}
