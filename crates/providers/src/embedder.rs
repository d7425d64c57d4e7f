//! Embedder backed by a provider's `/embeddings` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use blitzcoder_core::error::MemoryError;
use blitzcoder_core::memory::Embedder;
use blitzcoder_core::provider::{EmbeddingRequest, Provider};

pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    dimensions: usize,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts.to_vec(),
            })
            .await
            .map_err(|e| MemoryError::EmbeddingFailed(e.to_string()))?;

        if let Some(bad) = response.embeddings.iter().find(|v| v.len() != self.dimensions) {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimensions,
                got: bad.len(),
            });
        }
        Ok(response.embeddings)
    }
}
