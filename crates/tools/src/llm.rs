//! Completion client for tools that ask the model to generate text.

use std::sync::{Arc, LazyLock};

use blitzcoder_core::error::ToolError;
use blitzcoder_core::message::Message;
use blitzcoder_core::provider::{Provider, ProviderRequest};
use regex_lite::Regex;
use tracing::debug;

static FENCED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```[\w+.\-]*[ \t]*\r?\n?(.*?)```").ok());

/// Provider handle plus the model settings generation tools share.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// One system + user exchange with no tools bound. Returns the answer text.
    pub async fn generate(&self, tool_name: &str, system: &str, user: &str) -> Result<String, ToolError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system), Message::user(user)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: Vec::new(),
        };
        debug!(tool = tool_name, model = %self.model, "Generating with provider");
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ToolError::failed(tool_name, format!("generation failed: {e}")))?;
        Ok(response.message.content)
    }
}

/// Contents of the first fenced code block, or the whole text trimmed.
pub fn extract_fenced(text: &str) -> String {
    FENCED
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| text.trim().to_string())
}
