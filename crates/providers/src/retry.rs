//! Bounded retry with exponential backoff for transient provider failures.
//!
//! Only errors for which `ProviderError::is_transient` holds are retried;
//! everything else is returned on the first attempt. Each retry re-sends the
//! whole request, so callers must not rely on the service being idempotent.
//! For streams only opening the stream is retried; once chunks have been
//! handed out, an interruption is passed through to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blitzcoder_core::error::ProviderError;
use blitzcoder_core::provider::{
    ChunkReceiver, EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};
use tracing::warn;

/// Upper bound for a single wait, whatever the provider asks for.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Run `f` until it succeeds, fails fatally, or `max_retries` retries are spent.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    provider_name: &str,
    mut f: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0u32;

    loop {
        let err = match f().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !err.is_transient() || attempt >= max_retries {
            return Err(err);
        }
        attempt += 1;

        let wait = match &err {
            ProviderError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(*retry_after_secs))
            }
            _ => backoff,
        }
        .min(MAX_BACKOFF);

        warn!(
            provider = provider_name,
            attempt,
            max_retries,
            backoff_ms = wait.as_millis() as u64,
            error = %err,
            "Request failed, retrying"
        );
        tokio::time::sleep(wait).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Wraps a provider so completions and embeddings are retried.
pub struct RetryingProvider {
    inner: Arc<dyn Provider>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn Provider>, max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            inner,
            max_retries,
            initial_backoff,
        }
    }
}

#[async_trait]
impl Provider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        with_retry(self.max_retries, self.initial_backoff, self.inner.name(), || {
            self.inner.complete(request.clone())
        })
        .await
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        with_retry(self.max_retries, self.initial_backoff, self.inner.name(), || {
            self.inner.stream(request.clone())
        })
        .await
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        with_retry(self.max_retries, self.initial_backoff, self.inner.name(), || {
            self.inner.embed(request.clone())
        })
        .await
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
