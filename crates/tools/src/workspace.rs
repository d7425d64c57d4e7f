//! The agent's working directory.
//!
//! Tools never touch the process-wide cwd. They share a `Workspace` whose
//! directory `change_directory` moves, and resolve relative paths against it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use blitzcoder_core::error::ToolError;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct Workspace {
    cwd: Arc<RwLock<PathBuf>>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Arc::new(RwLock::new(root.into())),
        }
    }

    /// Start in the process's current directory.
    pub fn from_current_dir() -> Result<Self, ToolError> {
        let dir = std::env::current_dir()
            .map_err(|e| ToolError::failed("workspace", format!("cannot read current directory: {e}")))?;
        Ok(Self::new(dir))
    }

    pub async fn cwd(&self) -> PathBuf {
        self.cwd.read().await.clone()
    }

    /// Resolve `path` against the current directory. Absolute paths pass through.
    pub async fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.cwd.read().await.join(p)
        }
    }

    /// Move to `path`, which must be an existing directory.
    pub async fn change_dir(&self, path: &str) -> Result<PathBuf, ToolError> {
        let target = self.resolve(path).await;
        let canonical = tokio::fs::canonicalize(&target)
            .await
            .map_err(|e| ToolError::failed("change_directory", format!("{}: {e}", target.display())))?;
        if !canonical.is_dir() {
            return Err(ToolError::failed(
                "change_directory",
                format!("not a directory: {}", canonical.display()),
            ));
        }
        *self.cwd.write().await = canonical.clone();
        Ok(canonical)
    }
}
