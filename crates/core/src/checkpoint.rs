//! Session persistence.
//!
//! A checkpointer saves a whole session transcript under its thread id so
//! a conversation can be resumed in a later process.

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::message::{Session, ThreadId};

#[async_trait]
pub trait Checkpointer: Send + Sync {
    fn name(&self) -> &str;

    /// The last saved state of a thread, if any.
    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Session>, MemoryError>;

    /// Persist the session, replacing any earlier checkpoint of the thread.
    async fn save(&self, session: &Session) -> Result<(), MemoryError>;
}
