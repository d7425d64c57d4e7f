//! Session checkpointers.
//!
//! `InMemoryCheckpointer` keeps threads for the process lifetime;
//! `FileCheckpointer` writes one `<thread_id>.json` per thread so a session
//! can be resumed after a restart.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use blitzcoder_core::checkpoint::Checkpointer;
use blitzcoder_core::error::MemoryError;
use blitzcoder_core::message::{Session, ThreadId};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct InMemoryCheckpointer {
    sessions: Arc<RwLock<HashMap<ThreadId, Session>>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Session>, MemoryError> {
        Ok(self.sessions.read().await.get(thread_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), MemoryError> {
        self.sessions
            .write()
            .await
            .insert(session.thread_id.clone(), session.clone());
        Ok(())
    }
}

pub struct FileCheckpointer {
    dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, thread_id: &ThreadId) -> Result<PathBuf, MemoryError> {
        let id = thread_id.as_str();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(MemoryError::Storage(format!("Invalid thread id: {id:?}")));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Session>, MemoryError> {
        let path = self.path_for(thread_id)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read checkpoint {}: {e}",
                    path.display()
                )));
            }
        };
        let session = serde_json::from_str(&content).map_err(|e| {
            MemoryError::Storage(format!("Corrupted checkpoint {}: {e}", path.display()))
        })?;
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<(), MemoryError> {
        let path = self.path_for(&session.thread_id)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            MemoryError::Storage(format!("Failed to create sessions directory: {e}"))
        })?;
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize session: {e}")))?;

        // Write then rename so a crash never leaves a half-written checkpoint.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| MemoryError::Storage(format!("Failed to write checkpoint: {e}")))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| MemoryError::Storage(format!("Failed to write checkpoint: {e}")))?;

        debug!(thread_id = %session.thread_id, messages = session.len(), "Session checkpointed");
        Ok(())
    }
}
