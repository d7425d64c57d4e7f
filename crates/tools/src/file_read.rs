//! inspect_file: read a UTF-8 file.

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;

use crate::workspace::Workspace;

pub struct InspectFileTool {
    workspace: Workspace,
}

#[derive(Deserialize)]
struct Args {
    path: String,
}

impl InspectFileTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

/// Read `path` as text, distinguishing a missing file from a binary one.
pub(crate) async fn read_text(tool_name: &str, path: &std::path::Path) -> Result<String, ToolError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::failed(tool_name, format!("file not found: {}", path.display()))
        } else {
            ToolError::failed(tool_name, format!("cannot read {}: {e}", path.display()))
        }
    })?;
    String::from_utf8(bytes).map_err(|_| {
        ToolError::failed(tool_name, format!("not a UTF-8 text file: {}", path.display()))
    })
}

#[async_trait]
impl Tool for InspectFileTool {
    fn name(&self) -> &str {
        "inspect_file"
    }

    fn description(&self) -> &str {
        "Read the full contents of a text file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let path = self.workspace.resolve(&args.path).await;
        let content = read_text(self.name(), &path).await?;
        Ok(ToolResult::ok(content))
    }
}
