//! generate_project_structure, generate_architecture_plan,
//! generate_folder_creation_script, generate_file_content.

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;

use super::{FileBrief, Generator};

pub struct GenerateStructureTool {
    generator: Generator,
}

impl GenerateStructureTool {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

#[derive(Deserialize)]
struct StructureArgs {
    framework: String,
    use_case: String,
}

#[async_trait]
impl Tool for GenerateStructureTool {
    fn name(&self) -> &str {
        "generate_project_structure"
    }

    fn description(&self) -> &str {
        "Generate a production-ready project folder tree for a framework and use case. \
         Returns the tree as text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "framework": { "type": "string", "description": "e.g. FastAPI, Spring Boot, Express" },
                "use_case": { "type": "string", "description": "What the project is for" }
            },
            "required": ["framework", "use_case"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: StructureArgs = parse_args(arguments)?;
        let tree = self
            .generator
            .project_structure(self.name(), &args.framework, &args.use_case)
            .await?;
        Ok(ToolResult::ok(tree))
    }
}

pub struct GeneratePlanTool {
    generator: Generator,
}

impl GeneratePlanTool {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

#[derive(Deserialize)]
struct PlanArgs {
    framework: String,
    use_case: String,
    tree_structure: String,
}

#[async_trait]
impl Tool for GeneratePlanTool {
    fn name(&self) -> &str {
        "generate_architecture_plan"
    }

    fn description(&self) -> &str {
        "Analyze a project folder tree and produce a JSON architecture plan with \
         per-file purpose, features, dependencies and priority."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "framework": { "type": "string" },
                "use_case": { "type": "string" },
                "tree_structure": { "type": "string", "description": "Folder tree text" }
            },
            "required": ["framework", "use_case", "tree_structure"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: PlanArgs = parse_args(arguments)?;
        let plan = self
            .generator
            .architecture_plan(self.name(), &args.framework, &args.use_case, &args.tree_structure)
            .await?;
        let json = serde_json::to_value(&plan)
            .map_err(|e| ToolError::failed(self.name(), e))?;
        let text = serde_json::to_string_pretty(&json)
            .map_err(|e| ToolError::failed(self.name(), e))?;
        Ok(ToolResult::ok(text).with_data(json))
    }
}

pub struct GenerateFolderScriptTool {
    generator: Generator,
}

impl GenerateFolderScriptTool {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

#[derive(Deserialize)]
struct FolderScriptArgs {
    tree_structure: String,
}

#[async_trait]
impl Tool for GenerateFolderScriptTool {
    fn name(&self) -> &str {
        "generate_folder_creation_script"
    }

    fn description(&self) -> &str {
        "Generate a standalone Python script that recreates a folder tree.          Returns the script; it is not executed. Use create_project_structure to build the tree directly."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "tree_structure": { "type": "string", "description": "Folder tree text" }
            },
            "required": ["tree_structure"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: FolderScriptArgs = parse_args(arguments)?;
        let script = self.generator.folder_script(self.name(), &args.tree_structure).await?;
        Ok(ToolResult::ok(script))
    }
}

pub struct GenerateFileContentTool {
    generator: Generator,
}

impl GenerateFileContentTool {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

#[derive(Deserialize)]
struct ContentArgs {
    framework: String,
    use_case: String,
    file_path: String,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(default)]
    features: Option<String>,
    #[serde(default)]
    architecture_overview: Option<String>,
    #[serde(default)]
    data_flow: Option<String>,
    #[serde(default)]
    dependencies: Option<String>,
}

#[async_trait]
impl Tool for GenerateFileContentTool {
    fn name(&self) -> &str {
        "generate_file_content"
    }

    fn description(&self) -> &str {
        "Generate the full contents of one project file from its purpose and the \
         surrounding architecture. Returns code; does not write it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "framework": { "type": "string" },
                "use_case": { "type": "string" },
                "file_path": { "type": "string", "description": "Path relative to the project root" },
                "purpose": { "type": "string" },
                "features": { "type": "string", "description": "Comma separated key features" },
                "architecture_overview": { "type": "string" },
                "data_flow": { "type": "string" },
                "dependencies": { "type": "string", "description": "JSON list of files this one depends on" }
            },
            "required": ["framework", "use_case", "file_path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: ContentArgs = parse_args(arguments)?;
        let brief = FileBrief {
            framework: &args.framework,
            use_case: &args.use_case,
            file_path: &args.file_path,
            purpose: args.purpose.as_deref().unwrap_or("Core application file"),
            features: args.features.as_deref().unwrap_or(""),
            architecture_overview: args.architecture_overview.as_deref().unwrap_or(""),
            data_flow: args.data_flow.as_deref().unwrap_or(""),
            dependencies: args.dependencies.as_deref().unwrap_or("[]"),
        };
        let code = self.generator.file_content(self.name(), &brief).await?;
        Ok(ToolResult::ok(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::test_support::{Scripted, client};

    #[tokio::test]
    async fn structure_tool_strips_fences() {
        let provider = Scripted::new(["Sure!\n```\napp/\n└── main.py\n```"]);
        let tool = GenerateStructureTool::new(Generator::new(client(provider.clone())));
        let result = tool
            .execute(serde_json::json!({"framework": "FastAPI", "use_case": "todo"}))
            .await
            .unwrap();
        assert_eq!(result.output, "app/\n└── main.py");

        let requests = provider.requests.lock().unwrap();
        assert!(requests[0].tools.is_empty());
        assert!(requests[0].messages[0].content.contains("Framework: FastAPI"));
    }

    #[tokio::test]
    async fn plan_tool_returns_structured_data() {
        let provider = Scripted::new([
            "```json\n{\"architecture_overview\": \"mvc\", \"file_analysis\": {\"main.py\": {\"purpose\": \"entry\"}}}\n```",
        ]);
        let tool = GeneratePlanTool::new(Generator::new(client(provider)));
        let result = tool
            .execute(serde_json::json!({
                "framework": "FastAPI", "use_case": "todo", "tree_structure": "main.py"
            }))
            .await
            .unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["architecture_overview"], "mvc");
        assert_eq!(data["file_analysis"]["main.py"]["implementation_priority"], "medium");
    }

    #[tokio::test]
    async fn plan_tool_rejects_prose() {
        let provider = Scripted::new(["I could not produce a plan."]);
        let tool = GeneratePlanTool::new(Generator::new(client(provider)));
        let err = tool
            .execute(serde_json::json!({
                "framework": "x", "use_case": "y", "tree_structure": "z"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn folder_script_is_returned_not_run() {
        let provider = Scripted::new([
            "```python\nimport os\n\ndef create_folder_structure(root_dir):\n    os.makedirs(os.path.join(root_dir, 'app'), exist_ok=True)\n```",
        ]);
        let tool = GenerateFolderScriptTool::new(Generator::new(client(provider.clone())));
        let result = tool
            .execute(serde_json::json!({"tree_structure": "app/\n└── main.py"}))
            .await
            .unwrap();
        assert!(result.output.starts_with("import os"));
        assert!(result.output.contains("def create_folder_structure(root_dir):"));

        let requests = provider.requests.lock().unwrap();
        assert!(requests[0].messages[0].content.contains("Tree Structure:\napp/\n└── main.py"));
    }

    #[tokio::test]
    async fn content_tool_fills_defaults() {
        let provider = Scripted::new(["```python\nimport os\n```"]);
        let tool = GenerateFileContentTool::new(Generator::new(client(provider.clone())));
        let result = tool
            .execute(serde_json::json!({
                "framework": "Flask", "use_case": "blog", "file_path": "app.py"
            }))
            .await
            .unwrap();
        assert_eq!(result.output, "import os");
        let system = provider.requests.lock().unwrap()[0].messages[0].content.clone();
        assert!(system.contains("Purpose: Core application file"));
        assert!(system.contains("FILE DEPENDENCIES:\n[]"));
    }
}
