//! Shell tool: run a command line under `sh -c` with a timeout.
//!
//! There is no allowlist. The only guard is the timeout, after which the
//! command and everything it started are killed and the partial output returned.

use std::time::Duration;

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::process;
use crate::workspace::Workspace;

pub const MAX_TIMEOUT_SECS: u64 = 600;

pub struct ShellTool {
    workspace: Workspace,
    default_timeout_secs: u64,
}

#[derive(Deserialize)]
struct Args {
    command: String,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    timeout: Option<u64>,
}

impl ShellTool {
    pub fn new(workspace: Workspace, default_timeout_secs: u64) -> Self {
        Self {
            workspace,
            default_timeout_secs: default_timeout_secs.clamp(1, MAX_TIMEOUT_SECS),
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "run_shell_command"
    }

    fn description(&self) -> &str {
        "Run a shell command and return its combined stdout and stderr. \
         Use for builds, tests, git, package managers and inspecting the system."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command line to execute"
                },
                "cwd": {
                    "type": "string",
                    "description": "Directory to run in (defaults to the current directory)"
                },
                "timeout": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_TIMEOUT_SECS,
                    "description": "Timeout in seconds"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let timeout = Duration::from_secs(
            args.timeout
                .unwrap_or(self.default_timeout_secs)
                .clamp(1, MAX_TIMEOUT_SECS),
        );
        let cwd = match &args.cwd {
            Some(dir) => self.workspace.resolve(dir).await,
            None => self.workspace.cwd().await,
        };
        if !cwd.is_dir() {
            return Err(ToolError::failed(
                self.name(),
                format!("working directory does not exist: {}", cwd.display()),
            ));
        }

        debug!(command = %args.command, cwd = %cwd.display(), "Executing shell command");

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&args.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&args.command);
            c
        };
        cmd.current_dir(&cwd);

        let out = process::run(cmd, timeout, self.name()).await?;
        let result = ToolResult {
            call_id: String::new(),
            success: out.success(),
            output: out.render(timeout),
            data: None,
        };
        Ok(result.with_data(serde_json::json!({
            "exit_code": out.exit_code,
            "timed_out": out.timed_out,
        })))
    }
}
