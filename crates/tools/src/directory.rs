//! current_directory and change_directory.

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;

use crate::workspace::Workspace;

pub struct CurrentDirectoryTool {
    workspace: Workspace,
}

impl CurrentDirectoryTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for CurrentDirectoryTool {
    fn name(&self) -> &str {
        "current_directory"
    }

    fn description(&self) -> &str {
        "Return the current working directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::ok(self.workspace.cwd().await.display().to_string()))
    }
}

pub struct ChangeDirectoryTool {
    workspace: Workspace,
}

#[derive(Deserialize)]
struct Args {
    path: String,
}

impl ChangeDirectoryTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ChangeDirectoryTool {
    fn name(&self) -> &str {
        "change_directory"
    }

    fn description(&self) -> &str {
        "Change the current working directory used by all other tools."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to move to, absolute or relative"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let dir = self.workspace.change_dir(&args.path).await?;
        Ok(ToolResult::ok(dir.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn change_then_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        let ws = Workspace::new(dir.path());
        let cd = ChangeDirectoryTool::new(ws.clone());
        let pwd = CurrentDirectoryTool::new(ws);

        let moved = cd.execute(serde_json::json!({"path": "app"})).await.unwrap();
        let here = pwd.execute(serde_json::json!({})).await.unwrap();
        assert_eq!(moved.output, here.output);
        assert!(here.output.ends_with("app"));
    }
}
