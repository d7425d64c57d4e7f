//! Codebase listing and name search.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use blitzcoder_core::error::ToolError;
use blitzcoder_core::tool::{Tool, ToolResult, parse_args};
use serde::Deserialize;
use walkdir::{DirEntry, WalkDir};

use crate::workspace::Workspace;

const SKIP_DIRS: &[&str] = &["__pycache__", ".git", ".venv", ".cache", "node_modules"];
const SKIP_FILES: &[&str] = &[".DS_Store"];
const SKIP_EXTS: &[&str] = &["pyc", "pyo"];

/// Listings longer than this are cut off.
const MAX_ENTRIES: usize = 2000;

fn is_skipped_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name) || name.starts_with('.')
}

fn is_listed(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if entry.file_type().is_dir() {
        return !is_skipped_dir(&name);
    }
    if SKIP_FILES.contains(&name.as_ref()) || name.starts_with('.') {
        return false;
    }
    !entry
        .path()
        .extension()
        .is_some_and(|ext| SKIP_EXTS.iter().any(|s| ext == *s))
}

/// Recursive listing of `root`, as sorted relative paths. Directories end in `/`.
pub fn list_tree(root: &Path) -> Vec<String> {
    let mut entries: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(is_listed)
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?.to_string_lossy().replace('\\', "/");
            Some(if e.file_type().is_dir() { format!("{rel}/") } else { rel })
        })
        .collect();
    entries.sort();
    entries
}

/// All paths under `root` whose final component equals `name`.
pub fn find_by_name(root: &Path, name: &str) -> Vec<String> {
    let mut matches: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir() && SKIP_DIRS.contains(&e.file_name().to_string_lossy().as_ref()))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy() == name)
        .filter_map(|e| {
            e.path()
                .strip_prefix(root)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    matches.sort();
    matches
}

async fn blocking<T: Send + 'static>(
    tool_name: &str,
    f: impl FnOnce() -> T + Send + 'static,
) -> Result<T, ToolError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ToolError::failed(tool_name, e))
}

fn require_dir(tool_name: &str, dir: &Path) -> Result<(), ToolError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(ToolError::failed(
            tool_name,
            format!("not a directory: {}", dir.display()),
        ))
    }
}

pub struct NavigateCodebaseTool {
    workspace: Workspace,
}

impl NavigateCodebaseTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct NavigateArgs {
    #[serde(default)]
    path: Option<String>,
}

#[async_trait]
impl Tool for NavigateCodebaseTool {
    fn name(&self) -> &str {
        "navigate_codebase"
    }

    fn description(&self) -> &str {
        "Recursively list every file and directory under a path, skipping caches, \
         virtualenvs, node_modules and hidden entries."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Root directory (defaults to the current directory)"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: NavigateArgs = parse_args(arguments)?;
        let root: PathBuf = match &args.path {
            Some(p) => self.workspace.resolve(p).await,
            None => self.workspace.cwd().await,
        };
        require_dir(self.name(), &root)?;

        let listing = {
            let root = root.clone();
            blocking(self.name(), move || list_tree(&root)).await?
        };
        if listing.is_empty() {
            return Ok(ToolResult::ok(format!("{} is empty", root.display())));
        }

        let total = listing.len();
        let mut output = listing
            .iter()
            .take(MAX_ENTRIES)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        if total > MAX_ENTRIES {
            output.push_str(&format!("\n... {} more entries", total - MAX_ENTRIES));
        }
        Ok(ToolResult::ok(output).with_data(serde_json::json!({ "count": total })))
    }
}

pub struct FindPathTool {
    workspace: Workspace,
}

impl FindPathTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct FindArgs {
    name: String,
    #[serde(default)]
    root_path: Option<String>,
}

#[async_trait]
impl Tool for FindPathTool {
    fn name(&self) -> &str {
        "look_for_file_or_directory"
    }

    fn description(&self) -> &str {
        "Search recursively for files or directories with an exact name and return their relative paths."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Exact file or directory name"
                },
                "root_path": {
                    "type": "string",
                    "description": "Where to start searching (defaults to the current directory)"
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: FindArgs = parse_args(arguments)?;
        let root = match &args.root_path {
            Some(p) => self.workspace.resolve(p).await,
            None => self.workspace.cwd().await,
        };
        require_dir(self.name(), &root)?;

        let matches = {
            let root = root.clone();
            let name = args.name.clone();
            blocking(self.name(), move || find_by_name(&root, &name)).await?
        };
        if matches.is_empty() {
            return Ok(ToolResult::ok(format!(
                "No matches found for \"{}\" in \"{}\".",
                args.name,
                root.display()
            )));
        }
        Ok(ToolResult::ok(matches.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for d in ["src/api", ".git/objects", "node_modules/left-pad", "__pycache__", ".hidden"] {
            std::fs::create_dir_all(root.join(d)).unwrap();
        }
        for f in [
            "README.md",
            "src/main.py",
            "src/api/routes.py",
            "src/api/routes.pyc",
            ".env",
            ".DS_Store",
            ".git/HEAD",
            "node_modules/left-pad/index.js",
            "__pycache__/main.cpython-312.pyc",
        ] {
            std::fs::write(root.join(f), "").unwrap();
        }
        dir
    }

    #[test]
    fn listing_skips_noise_and_is_sorted() {
        let dir = fixture();
        assert_eq!(
            list_tree(dir.path()),
            vec!["README.md", "src/", "src/api/", "src/api/routes.py", "src/main.py"]
        );
    }

    #[test]
    fn find_returns_all_matches() {
        let dir = fixture();
        std::fs::write(dir.path().join("src/api/main.py"), "").unwrap();
        assert_eq!(
            find_by_name(dir.path(), "main.py"),
            vec!["src/api/main.py", "src/main.py"]
        );
        assert_eq!(find_by_name(dir.path(), "api"), vec!["src/api"]);
        assert!(find_by_name(dir.path(), "index.js").is_empty());
    }

    #[tokio::test]
    async fn navigate_tool_uses_workspace_cwd() {
        let dir = fixture();
        let tool = NavigateCodebaseTool::new(Workspace::new(dir.path().join("src")));
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert_eq!(result.output, "api/\napi/routes.py\nmain.py");
        assert_eq!(result.data.unwrap()["count"], 3);
    }

    #[tokio::test]
    async fn find_tool_reports_no_matches() {
        let dir = fixture();
        let tool = FindPathTool::new(Workspace::new(dir.path()));
        let result = tool
            .execute(serde_json::json!({"name": "Cargo.toml"}))
            .await
            .unwrap();
        assert!(result.output.starts_with("No matches found for \"Cargo.toml\""));
    }

    #[tokio::test]
    async fn navigate_rejects_files() {
        let dir = fixture();
        let tool = NavigateCodebaseTool::new(Workspace::new(dir.path()));
        assert!(tool.execute(serde_json::json!({"path": "README.md"})).await.is_err());
    }
}
