//! explain_code and refactor_code: model-backed reading of workspace files.

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;

use crate::file_read::read_text;
use crate::llm::{LlmClient, extract_fenced};
use crate::scaffold::prompts;
use crate::workspace::Workspace;

/// Files larger than this are not sent to the model.
const MAX_SOURCE_BYTES: usize = 200 * 1024;

async fn load_source(tool_name: &str, workspace: &Workspace, path: &str) -> Result<String, ToolError> {
    let resolved = workspace.resolve(path).await;
    let code = read_text(tool_name, &resolved).await?;
    if code.len() > MAX_SOURCE_BYTES {
        return Err(ToolError::failed(
            tool_name,
            format!("{} is too large ({} bytes)", resolved.display(), code.len()),
        ));
    }
    Ok(code)
}

pub struct ExplainCodeTool {
    llm: LlmClient,
    workspace: Workspace,
}

impl ExplainCodeTool {
    pub fn new(llm: LlmClient, workspace: Workspace) -> Self {
        Self { llm, workspace }
    }
}

#[derive(Deserialize)]
struct ExplainArgs {
    path: String,
}

#[async_trait]
impl Tool for ExplainCodeTool {
    fn name(&self) -> &str {
        "explain_code"
    }

    fn description(&self) -> &str {
        "Read a source file and explain what it does."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File to explain" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: ExplainArgs = parse_args(arguments)?;
        let code = load_source(self.name(), &self.workspace, &args.path).await?;
        let (system, user) = prompts::explain_code(&args.path, &code);
        let explanation = self.llm.generate(self.name(), &system, &user).await?;
        Ok(ToolResult::ok(explanation.trim()))
    }
}

pub struct RefactorCodeTool {
    llm: LlmClient,
    workspace: Workspace,
}

impl RefactorCodeTool {
    pub fn new(llm: LlmClient, workspace: Workspace) -> Self {
        Self { llm, workspace }
    }
}

#[derive(Deserialize)]
struct RefactorArgs {
    path: String,
    #[serde(default)]
    instructions: Option<String>,
}

#[async_trait]
impl Tool for RefactorCodeTool {
    fn name(&self) -> &str {
        "refactor_code"
    }

    fn description(&self) -> &str {
        "Produce a refactored version of a source file. The file is not modified; \
         use write_code_to_file to apply the result."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File to refactor" },
                "instructions": { "type": "string", "description": "Optional refactoring goal" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: RefactorArgs = parse_args(arguments)?;
        let code = load_source(self.name(), &self.workspace, &args.path).await?;
        let (system, user) = prompts::refactor_code(&args.path, &code, args.instructions.as_deref());
        let answer = self.llm.generate(self.name(), &system, &user).await?;
        let refactored = extract_fenced(&answer);
        Ok(ToolResult::ok(refactored.clone()).with_data(serde_json::json!({
            "path": args.path,
            "code": refactored,
            "notes": answer,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::test_support::{Scripted, client};

    #[tokio::test]
    async fn explain_sends_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calc.py"), "def add(a, b):\n    return a + b\n").unwrap();
        let provider = Scripted::new(["  Adds two numbers.  "]);
        let tool = ExplainCodeTool::new(client(provider.clone()), Workspace::new(dir.path()));

        let result = tool.execute(serde_json::json!({"path": "calc.py"})).await.unwrap();
        assert_eq!(result.output, "Adds two numbers.");
        let requests = provider.requests.lock().unwrap();
        assert!(requests[0].messages[1].content.contains("return a + b"));
    }

    #[tokio::test]
    async fn refactor_returns_code_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m.py"), "x=1\n").unwrap();
        let provider = Scripted::new(["```python\nx = 1\n```\n- spacing"]);
        let tool = RefactorCodeTool::new(client(provider), Workspace::new(dir.path()));

        let result = tool.execute(serde_json::json!({"path": "m.py"})).await.unwrap();
        assert_eq!(result.output, "x = 1");
        assert_eq!(std::fs::read_to_string(dir.path().join("m.py")).unwrap(), "x=1\n");
    }

    #[tokio::test]
    async fn missing_file_skips_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Scripted::new(Vec::<String>::new());
        let tool = ExplainCodeTool::new(client(provider.clone()), Workspace::new(dir.path()));
        assert!(tool.execute(serde_json::json!({"path": "gone.rs"})).await.is_err());
        assert!(provider.requests.lock().unwrap().is_empty());
    }
}
