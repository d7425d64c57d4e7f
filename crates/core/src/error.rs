//! Error types for the BlitzCoder domain.
//!
//! Each bounded context has its own `thiserror` enum; [`Error`] wraps them
//! all for callers that don't care which layer failed.

use thiserror::Error;

/// The top-level error type for all BlitzCoder operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether a retry has any chance of succeeding.
    ///
    /// Network trouble, rate limits and 5xx responses are transient.
    /// Authentication, configuration and other client errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::Network(_)
            | Self::Timeout(_)
            | Self::StreamInterrupted(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_)
            | Self::ModelNotFound(_)
            | Self::NotConfigured(_)
            | Self::InvalidResponse(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    pub fn failed(tool_name: &str, reason: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Conditions that end a turn early. The session itself survives them.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Recursion limit of {limit} model calls exceeded for this turn")]
    RecursionLimitExceeded { limit: usize },

    #[error("Completion service temporarily unavailable: {0}")]
    TransientService(ProviderError),

    #[error("Completion service error: {0}")]
    FatalService(ProviderError),
}

impl From<ProviderError> for AgentError {
    fn from(err: ProviderError) -> Self {
        if err.is_transient() {
            Self::TransientService(err)
        } else {
            Self::FatalService(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::Timeout {
            tool_name: "run_shell_command".into(),
            timeout_secs: 60,
        });
        assert!(err.to_string().contains("run_shell_command"));
        assert!(err.to_string().contains("60s"));
    }

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Network("reset".into()).is_transient());
        assert!(ProviderError::RateLimited { retry_after_secs: 3 }.is_transient());
        assert!(
            ProviderError::ApiError {
                status_code: 503,
                message: "busy".into()
            }
            .is_transient()
        );
        assert!(
            !ProviderError::ApiError {
                status_code: 400,
                message: "bad".into()
            }
            .is_transient()
        );
        assert!(!ProviderError::AuthenticationFailed("nope".into()).is_transient());
    }

    #[test]
    fn provider_error_maps_to_agent_error() {
        let transient: AgentError = ProviderError::Timeout("slow".into()).into();
        assert!(matches!(transient, AgentError::TransientService(_)));

        let fatal: AgentError = ProviderError::NotConfigured("no key".into()).into();
        assert!(matches!(fatal, AgentError::FatalService(_)));
    }
}
