//! Configuration loading, validation, and management for BlitzCoder.
//!
//! Loads configuration from `~/.blitzcoder/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.blitzcoder/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    /// Retry policy for transient completion-service failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "qwen-qwq-32b".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("tools", &self.tools)
            .field("retry", &self.retry)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model calls per turn before the turn is aborted
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: usize,

    /// Replaces the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Session checkpointing: "none", "in_memory" or "file"
    #[serde(default = "default_checkpoint")]
    pub checkpoint: String,
}

fn default_recursion_limit() -> usize {
    25
}
fn default_checkpoint() -> String {
    "file".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            recursion_limit: default_recursion_limit(),
            system_prompt: None,
            checkpoint: default_checkpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "in_memory" or "file"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Store file for the "file" backend; defaults to ~/.blitzcoder/memory/memories.jsonl
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// "hash" (local) or "provider" (the completion provider's /embeddings)
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dims")]
    pub embedding_dims: usize,

    /// Memories recalled per turn
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    /// Characters of the answer kept in a memory summary
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Oldest records are evicted past this many per user. Unset = unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records_per_user: Option<usize>,
}

fn default_memory_backend() -> String {
    "in_memory".into()
}
fn default_embedding_provider() -> String {
    "hash".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dims() -> usize {
    256
}
fn default_recall_limit() -> usize {
    5
}
fn default_preview_chars() -> usize {
    200
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            embedding_dims: default_embedding_dims(),
            recall_limit: default_recall_limit(),
            preview_chars: default_preview_chars(),
            max_records_per_user: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Enables run_shell_command
    #[serde(default = "default_true")]
    pub shell: bool,

    /// Enables execute_python_code
    #[serde(default = "default_true")]
    pub python_exec: bool,

    #[serde(default = "default_shell_timeout")]
    pub shell_timeout_secs: u64,

    #[serde(default = "default_python_timeout")]
    pub python_timeout_secs: u64,

    #[serde(default = "default_python_bin")]
    pub python_bin: String,

    /// Enables run_dev_server
    #[serde(default = "default_true")]
    pub dev_server: bool,

    /// How long a dev server runs before its logs are returned
    #[serde(default = "default_dev_server_wait")]
    pub dev_server_wait_secs: u64,

    #[serde(default = "default_dev_server_max_lines")]
    pub dev_server_max_lines: usize,
}

fn default_shell_timeout() -> u64 {
    60
}
fn default_python_timeout() -> u64 {
    30
}
fn default_python_bin() -> String {
    "python3".into()
}
fn default_dev_server_wait() -> u64 {
    15
}
fn default_dev_server_max_lines() -> usize {
    100
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell: true,
            python_exec: true,
            shell_timeout_secs: default_shell_timeout(),
            python_timeout_secs: default_python_timeout(),
            python_bin: default_python_bin(),
            dev_server: true,
            dev_server_wait_secs: default_dev_server_wait(),
            dev_server_max_lines: default_dev_server_max_lines(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.blitzcoder/config.toml).
    ///
    /// Environment variables override the file:
    /// - `BLITZCODER_API_KEY` (highest priority), then `GROQ_API_KEY`,
    ///   `OPENAI_API_KEY`, `OPENROUTER_API_KEY`
    /// - `BLITZCODER_PROVIDER`
    /// - `BLITZCODER_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("BLITZCODER_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = lookup("GROQ_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .or_else(|| lookup("OPENROUTER_API_KEY"));
        }

        if let Some(provider) = lookup("BLITZCODER_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("BLITZCODER_MODEL") {
            self.default_model = model;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".blitzcoder")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Where the file memory store lives.
    pub fn memory_path(&self) -> PathBuf {
        match &self.memory.path {
            Some(p) => PathBuf::from(p),
            None => Self::config_dir().join("memory").join("memories.jsonl"),
        }
    }

    /// Where file checkpoints are written, one JSON file per thread.
    pub fn sessions_dir() -> PathBuf {
        Self::config_dir().join("sessions")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.recursion_limit == 0 {
            return Err(ConfigError::ValidationError(
                "agent.recursion_limit must be at least 1".into(),
            ));
        }

        if !matches!(self.agent.checkpoint.as_str(), "none" | "in_memory" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "agent.checkpoint must be none, in_memory or file, got '{}'",
                self.agent.checkpoint
            )));
        }

        if !matches!(self.memory.backend.as_str(), "in_memory" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "memory.backend must be in_memory or file, got '{}'",
                self.memory.backend
            )));
        }

        if !matches!(self.memory.embedding_provider.as_str(), "hash" | "provider") {
            return Err(ConfigError::ValidationError(format!(
                "memory.embedding_provider must be hash or provider, got '{}'",
                self.memory.embedding_provider
            )));
        }

        if self.memory.recall_limit == 0 || self.memory.embedding_dims == 0 {
            return Err(ConfigError::ValidationError(
                "memory.recall_limit and memory.embedding_dims must be at least 1".into(),
            ));
        }

        if self.memory.max_records_per_user == Some(0) {
            return Err(ConfigError::ValidationError(
                "memory.max_records_per_user must be at least 1 when set".into(),
            ));
        }

        if self.tools.dev_server_wait_secs == 0 || self.tools.dev_server_max_lines == 0 {
            return Err(ConfigError::ValidationError(
                "tools.dev_server_wait_secs and tools.dev_server_max_lines must be at least 1".into(),
            ));
        }

        if self.retry.initial_backoff_ms == 0 {
            return Err(ConfigError::ValidationError(
                "retry.initial_backoff_ms must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            memory: MemoryConfig::default(),
            tools: ToolsConfig::default(),
            retry: RetryConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
