//! Run a Python script from the workspace.

use std::time::Duration;

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::process;
use crate::workspace::Workspace;

pub struct PythonExecTool {
    workspace: Workspace,
    python_bin: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct Args {
    path: String,
}

impl PythonExecTool {
    pub fn new(workspace: Workspace, python_bin: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            workspace,
            python_bin: python_bin.into(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }
}

#[async_trait]
impl Tool for PythonExecTool {
    fn name(&self) -> &str {
        "execute_python_code"
    }

    fn description(&self) -> &str {
        "Execute a Python file and return its output. Scripts that run too long are killed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the .py file to run"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let script = self.workspace.resolve(&args.path).await;
        if !script.is_file() {
            return Err(ToolError::failed(
                self.name(),
                format!("file not found: {}", script.display()),
            ));
        }

        debug!(script = %script.display(), bin = %self.python_bin, "Executing python script");

        let mut cmd = Command::new(&self.python_bin);
        cmd.arg(&script).current_dir(self.workspace.cwd().await);

        let out = process::run(cmd, self.timeout, self.name()).await?;
        Ok(ToolResult {
            call_id: String::new(),
            success: out.success(),
            output: out.render(self.timeout),
            data: None,
        })
    }
}
