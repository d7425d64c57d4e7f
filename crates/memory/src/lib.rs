//! Memory store implementations for BlitzCoder.

pub mod checkpoint;
pub mod file_backend;
pub mod hash_embedder;
pub mod in_memory;
pub mod index;
pub mod vector;

pub use checkpoint::{FileCheckpointer, InMemoryCheckpointer};
pub use file_backend::FileStore;
pub use hash_embedder::HashEmbedder;
pub use in_memory::InMemoryStore;
pub use vector::{best_similarity, cosine_similarity};
