//! create_or_delete_file: delete the file if it exists, otherwise create it empty.

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;

use crate::file_write::write_text;
use crate::workspace::Workspace;

pub struct CreateOrDeleteFileTool {
    workspace: Workspace,
}

#[derive(Deserialize)]
struct Args {
    path: String,
}

impl CreateOrDeleteFileTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for CreateOrDeleteFileTool {
    fn name(&self) -> &str {
        "create_or_delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file if it exists; otherwise create it as an empty file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file to create or delete"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let path = self.workspace.resolve(&args.path).await;

        if path.is_dir() {
            return Err(ToolError::failed(
                self.name(),
                format!("{} is a directory", path.display()),
            ));
        }
        if path.exists() {
            tokio::fs::remove_file(&path).await.map_err(|e| {
                ToolError::failed(self.name(), format!("cannot delete {}: {e}", path.display()))
            })?;
            return Ok(ToolResult::ok(format!("Deleted {}", path.display())));
        }

        write_text(self.name(), &path, "").await?;
        Ok(ToolResult::ok(format!("Created {}", path.display())))
    }
}
