//! run_dev_server: start a development server, collect its first log lines,
//! then stop it.
//!
//! The server runs under `sh -c` in its own process group until it has
//! printed `max_lines` lines or `wait_secs` have passed, whichever comes
//! first. Either way it is killed before the tool returns. Lines that look
//! like errors are repeated in a summary after the full log.

use std::time::Duration;

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::process::{self, Limits, ProcessOutput};
use crate::workspace::Workspace;

pub const MAX_WAIT_SECS: u64 = 120;
pub const MAX_LINES: usize = 1000;

const ERROR_MARKERS: &[&str] = &["ERROR", "Traceback", "Error:", "CRITICAL"];

/// Lines that mention an error marker, in log order.
pub fn error_lines(log: &str) -> Vec<&str> {
    log.lines()
        .filter(|line| ERROR_MARKERS.iter().any(|m| line.contains(m)))
        .collect()
}

pub struct DevServerTool {
    workspace: Workspace,
    default_wait_secs: u64,
    default_max_lines: usize,
}

#[derive(Deserialize)]
struct Args {
    command: String,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    max_lines: Option<usize>,
    #[serde(default)]
    wait_secs: Option<u64>,
}

impl DevServerTool {
    pub fn new(workspace: Workspace, default_wait_secs: u64, default_max_lines: usize) -> Self {
        Self {
            workspace,
            default_wait_secs: default_wait_secs.clamp(1, MAX_WAIT_SECS),
            default_max_lines: default_max_lines.clamp(1, MAX_LINES),
        }
    }
}

fn render(out: &ProcessOutput, wait: Duration, errors: &[&str]) -> String {
    let mut text = out.output.trim_end().to_string();
    if text.is_empty() {
        text.push_str("(no output)");
    }
    if out.truncated {
        text.push_str("\n[output truncated]");
    }
    let status = if out.timed_out {
        format!("[captured for {}s; server stopped]", wait.as_secs())
    } else if out.line_limit_reached {
        format!("[captured {} lines; server stopped]", out.lines)
    } else if let Some(code) = out.exit_code {
        format!("[server exited with code {code}]")
    } else {
        "[server terminated by signal]".to_string()
    };
    text.push('\n');
    text.push_str(&status);

    if errors.is_empty() {
        text.push_str("\n\nNo error lines found.");
    } else {
        text.push_str(&format!("\n\nError lines ({}):\n{}", errors.len(), errors.join("\n")));
    }
    text
}

#[async_trait]
impl Tool for DevServerTool {
    fn name(&self) -> &str {
        "run_dev_server"
    }

    fn description(&self) -> &str {
        "Start a development server (uvicorn, npm run dev, bun, cargo run, ...), \
         capture its startup logs, then stop it. Error lines are summarised at the end."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command that starts the server, e.g. 'uvicorn main:app --port 8000'"
                },
                "cwd": {
                    "type": "string",
                    "description": "Directory to run in (defaults to the current directory)"
                },
                "max_lines": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_LINES,
                    "description": "Stop after this many log lines"
                },
                "wait_secs": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_WAIT_SECS,
                    "description": "Stop after this many seconds"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let wait = Duration::from_secs(
            args.wait_secs
                .unwrap_or(self.default_wait_secs)
                .clamp(1, MAX_WAIT_SECS),
        );
        let max_lines = args.max_lines.unwrap_or(self.default_max_lines).clamp(1, MAX_LINES);
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

        debug!(command = %args.command, cwd = %cwd.display(), max_lines, "Starting dev server");

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

        let limits = Limits {
            timeout: wait,
            max_lines: Some(max_lines),
        };
        let out = process::run_with(cmd, limits, self.name()).await?;
        let errors = error_lines(&out.output);
        for line in &errors {
            warn!(tool = self.name(), line = %line, "Dev server reported an error");
        }

        // Still running when stopped means it started; an early non-zero exit means it didn't.
        let exited_badly = !out.timed_out && !out.line_limit_reached && out.exit_code != Some(0);
        let result = ToolResult {
            call_id: String::new(),
            success: errors.is_empty() && !exited_badly,
            output: render(&out, wait, &errors),
            data: None,
        };
        Ok(result.with_data(serde_json::json!({
            "lines": out.lines,
            "error_lines": errors.len(),
            "exit_code": out.exit_code,
            "stopped": out.timed_out || out.line_limit_reached,
        })))
    }
}
