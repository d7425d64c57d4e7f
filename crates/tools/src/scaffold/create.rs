//! create_project_structure: build a textual tree on disk.

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;

use super::tree::{create_tree, parse_tree};
use crate::workspace::Workspace;

pub struct CreateProjectStructureTool {
    workspace: Workspace,
}

impl CreateProjectStructureTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct Args {
    tree_structure: String,
    sub_root_dir: String,
}

#[async_trait]
impl Tool for CreateProjectStructureTool {
    fn name(&self) -> &str {
        "create_project_structure"
    }

    fn description(&self) -> &str {
        "Create the directories and empty files described by a folder tree under the given directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "tree_structure": {
                    "type": "string",
                    "description": "Folder tree using ├──/└──/│ or indentation; directories end with /"
                },
                "sub_root_dir": {
                    "type": "string",
                    "description": "Directory the tree is created in"
                }
            },
            "required": ["tree_structure", "sub_root_dir"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = parse_args(arguments)?;
        let entries = parse_tree(&args.tree_structure);
        if entries.is_empty() {
            return Err(ToolError::failed(self.name(), "tree structure contains no entries"));
        }

        let root = self.workspace.resolve(&args.sub_root_dir).await;
        let created = create_tree(&root, &entries)
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("{}: {e}", root.display())))?;

        let dirs = entries.iter().filter(|e| e.is_dir).count();
        Ok(ToolResult::ok(format!(
            "Project structure created at {} ({} directories, {} files, {} new)",
            root.display(),
            dirs,
            entries.len() - dirs,
            created.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_under_sub_root() {
        let dir = tempfile::tempdir().unwrap();
        let tool = CreateProjectStructureTool::new(Workspace::new(dir.path()));
        let result = tool
            .execute(serde_json::json!({
                "tree_structure": "svc/\n├── cmd/\n│   └── main.go\n└── go.mod",
                "sub_root_dir": "out"
            }))
            .await
            .unwrap();
        assert!(result.output.contains("2 directories, 2 files"));
        assert!(dir.path().join("out/svc/cmd/main.go").is_file());
        assert!(dir.path().join("out/svc/go.mod").is_file());
    }

    #[tokio::test]
    async fn empty_tree_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = CreateProjectStructureTool::new(Workspace::new(dir.path()));
        let err = tool
            .execute(serde_json::json!({"tree_structure": "```\n```", "sub_root_dir": "x"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no entries"));
    }
}
