//! Completion provider implementations for BlitzCoder.
//!
//! All providers implement the `blitzcoder_core::Provider` trait. The router
//! builds them from configuration and wraps each in the retry policy.

pub mod embedder;
pub mod openai_compat;
pub mod retry;
pub mod router;

pub use embedder::ProviderEmbedder;
pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryingProvider, with_retry};
pub use router::{ProviderRouter, build_from_config, model_for};
