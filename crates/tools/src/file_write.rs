//! write_code_to_file: write text to a file, creating parent directories.

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;

use crate::workspace::Workspace;

pub struct WriteCodeTool {
    workspace: Workspace,
}

#[derive(Deserialize)]
struct Args {
    path: String,
    code: String,
}

impl WriteCodeTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

/// Write `content` to `path`, creating missing parent directories.
pub(crate) async fn write_text(
    tool_name: &str,
    path: &std::path::Path,
    content: &str,
) -> Result<(), ToolError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            ToolError::failed(tool_name, format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| ToolError::failed(tool_name, format!("cannot write {}: {e}", path.display())))
}

#[async_trait]
impl Tool for WriteCodeTool {
    fn name(&self) -> &str {
        "write_code_to_file"
    }

    fn description(&self) -> &str {
        "Write code to a file, replacing any existing content. Parent directories are created."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write"
                },
                "code": {
                    "type": "string",
                    "description": "The full file contents"
                }
            },
            "required": ["path", "code"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let path = self.workspace.resolve(&args.path).await;
        write_text(self.name(), &path, &args.code).await?;
        Ok(ToolResult::ok(format!(
            "Wrote {} bytes to {}",
            args.code.len(),
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteCodeTool::new(Workspace::new(dir.path()));
        let result = tool
            .execute(serde_json::json!({"path": "a/b/main.rs", "code": "fn main() {}"}))
            .await
            .unwrap();
        assert!(result.output.contains("12 bytes"));
        let written = std::fs::read_to_string(dir.path().join("a/b/main.rs")).unwrap();
        assert_eq!(written, "fn main() {}");
    }

    #[tokio::test]
    async fn overwrite_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), "old content").unwrap();
        let tool = WriteCodeTool::new(Workspace::new(dir.path()));
        tool.execute(serde_json::json!({"path": "x.txt", "code": "new"}))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("x.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn missing_code_argument() {
        let tool = WriteCodeTool::new(Workspace::new("/tmp"));
        let result = tool.execute(serde_json::json!({"path": "x.txt"})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
