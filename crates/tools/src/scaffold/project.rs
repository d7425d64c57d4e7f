//! scaffold_project: structure → plan → per-file content → write.

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;
use tracing::{info, warn};

use super::plan::ArchitecturePlan;
use super::tree::parse_tree;
use super::{FileBrief, Generator};
use crate::file_write::write_text;
use crate::workspace::Workspace;

pub struct ScaffoldProjectTool {
    generator: Generator,
    workspace: Workspace,
}

impl ScaffoldProjectTool {
    pub fn new(generator: Generator, workspace: Workspace) -> Self {
        Self { generator, workspace }
    }
}

#[derive(Deserialize)]
struct Args {
    framework: String,
    use_case: String,
    #[serde(default)]
    project_root: Option<String>,
}

/// `./{framework}_project`, lowercased with spaces as underscores.
pub fn default_project_root(framework: &str) -> String {
    let safe: String = framework
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("./{safe}_project")
}

fn brief_for<'a>(
    args: &'a Args,
    plan: &'a ArchitecturePlan,
    path: &'a str,
    features: &'a str,
    dependencies: &'a str,
) -> FileBrief<'a> {
    let purpose = plan
        .file_analysis
        .get(path)
        .map(|a| a.purpose.as_str())
        .unwrap_or("Core application file");
    FileBrief {
        framework: &args.framework,
        use_case: &args.use_case,
        file_path: path,
        purpose,
        features,
        architecture_overview: &plan.architecture_overview,
        data_flow: &plan.data_flow,
        dependencies,
    }
}

#[async_trait]
impl Tool for ScaffoldProjectTool {
    fn name(&self) -> &str {
        "scaffold_project"
    }

    fn description(&self) -> &str {
        "Create a complete project: generate its folder structure and architecture plan, \
         then generate and write every planned file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "framework": { "type": "string" },
                "use_case": { "type": "string" },
                "project_root": {
                    "type": "string",
                    "description": "Where to create the project (default ./<framework>_project)"
                }
            },
            "required": ["framework", "use_case"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let root_arg = args
            .project_root
            .clone()
            .unwrap_or_else(|| default_project_root(&args.framework));
        let root = self.workspace.resolve(&root_arg).await;

        let tree = self
            .generator
            .project_structure(self.name(), &args.framework, &args.use_case)
            .await?;
        if parse_tree(&tree).is_empty() {
            return Err(ToolError::failed(self.name(), "model returned an empty project structure"));
        }

        let plan = self
            .generator
            .architecture_plan(self.name(), &args.framework, &args.use_case, &tree)
            .await?;
        let files = plan.files_in_order();
        if files.is_empty() {
            return Err(ToolError::failed(self.name(), "architecture plan lists no files"));
        }
        info!(root = %root.display(), files = files.len(), "Scaffolding project");

        let mut written = Vec::new();
        let mut failed = Vec::new();
        for path in files {
            let analysis = plan.file_analysis.get(path).cloned().unwrap_or_default();
            let features = analysis.key_features.join(", ");
            let dependencies =
                serde_json::to_string_pretty(&analysis.dependencies).unwrap_or_else(|_| "[]".into());
            let brief = brief_for(&args, &plan, path, &features, &dependencies);

            let target = match safe_join(&root, path) {
                Some(t) => t,
                None => {
                    warn!(path, "Skipping planned file outside the project root");
                    failed.push(path.to_string());
                    continue;
                }
            };
            match self.generator.file_content(self.name(), &brief).await {
                Ok(content) => {
                    write_text(self.name(), &target, &content).await?;
                    written.push(path.to_string());
                }
                Err(e) => {
                    warn!(path, error = %e, "File generation failed");
                    failed.push(path.to_string());
                }
            }
        }

        let shown = tokio::fs::canonicalize(&root).await.unwrap_or(root);
        let mut output = format!(
            "Project with {} files created at {}",
            written.len(),
            shown.display()
        );
        if !failed.is_empty() {
            output.push_str(&format!("\nFailed: {}", failed.join(", ")));
        }
        Ok(ToolResult {
            call_id: String::new(),
            success: !written.is_empty(),
            output,
            data: Some(serde_json::json!({ "written": written, "failed": failed })),
        })
    }
}

fn safe_join(root: &std::path::Path, rel: &str) -> Option<std::path::PathBuf> {
    let rel_path = std::path::Path::new(rel);
    rel_path
        .components()
        .all(|c| matches!(c, std::path::Component::Normal(_)))
        .then(|| root.join(rel_path))
}
