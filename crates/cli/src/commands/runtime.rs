//! Wiring configuration into providers, memory and the agent graph.

use std::sync::Arc;

use blitzcoder_agent::{AgentGraph, DEFAULT_SYSTEM_PROMPT};
use blitzcoder_config::AppConfig;
use blitzcoder_core::checkpoint::Checkpointer;
use blitzcoder_core::memory::{Embedder, MemoryStore, Namespace};
use blitzcoder_core::provider::Provider;
use blitzcoder_memory::{FileCheckpointer, FileStore, HashEmbedder, InMemoryCheckpointer, InMemoryStore};
use blitzcoder_providers::{ProviderEmbedder, build_from_config, model_for};
use blitzcoder_tools::{LlmClient, ToolContext, Workspace, build_registry};
use tracing::debug;

type BoxError = Box<dyn std::error::Error>;

/// Providers that run locally and accept requests without a key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp", "llama.cpp"];

pub fn load_config() -> Result<AppConfig, BoxError> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The default completion provider and the model to ask it for.
pub fn provider(config: &AppConfig) -> Result<(Arc<dyn Provider>, String), BoxError> {
    let router = build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;
    Ok((provider, model_for(config, &config.default_provider)))
}

/// Fail early with setup instructions when a hosted provider has no key.
pub fn require_api_key(config: &AppConfig) -> Result<(), BoxError> {
    let configured = config.has_api_key()
        || config
            .providers
            .get(&config.default_provider)
            .is_some_and(|p| p.api_key.is_some());
    if configured || KEYLESS_PROVIDERS.contains(&config.default_provider.as_str()) {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured for '{}'!", config.default_provider);
    eprintln!();
    eprintln!("  Set one of these environment variables (or put it in .env):");
    eprintln!("    GROQ_API_KEY=gsk_...            (default provider)");
    eprintln!("    OPENAI_API_KEY=sk-...");
    eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...");
    eprintln!("    BLITZCODER_API_KEY=...          (overrides all of the above)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_path().display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

pub fn embedder(config: &AppConfig, provider: &Arc<dyn Provider>) -> Arc<dyn Embedder> {
    let dims = config.memory.embedding_dims;
    match config.memory.embedding_provider.as_str() {
        "provider" => Arc::new(ProviderEmbedder::new(
            provider.clone(),
            config.memory.embedding_model.clone(),
            dims,
        )),
        _ => Arc::new(HashEmbedder::new(dims)),
    }
}

pub fn memory_store(config: &AppConfig, embedder: Arc<dyn Embedder>) -> Arc<dyn MemoryStore> {
    let cap = config.memory.max_records_per_user;
    match config.memory.backend.as_str() {
        "file" => Arc::new(FileStore::open(config.memory_path(), embedder, cap)),
        _ => Arc::new(InMemoryStore::with_capacity(embedder, cap)),
    }
}

pub fn checkpointer(config: &AppConfig) -> Option<Arc<dyn Checkpointer>> {
    let checkpointer: Arc<dyn Checkpointer> = match config.agent.checkpoint.as_str() {
        "file" => Arc::new(FileCheckpointer::new(AppConfig::sessions_dir())),
        "in_memory" => Arc::new(InMemoryCheckpointer::new()),
        _ => return None,
    };
    Some(checkpointer)
}

/// Build the agent for `user_id`, with every enabled tool bound to the
/// current directory and that user's memory namespace.
pub fn agent(config: &AppConfig, user_id: &str) -> Result<AgentGraph, BoxError> {
    let (provider, model) = provider(config)?;
    let memory = memory_store(config, embedder(config, &provider));

    let llm = LlmClient::new(provider.clone(), model.clone(), config.default_temperature)
        .with_max_tokens(config.default_max_tokens);
    let ctx = ToolContext {
        workspace: Workspace::from_current_dir()?,
        llm,
        memory: memory.clone(),
        namespace: Namespace::memories(user_id),
    };
    let tools = Arc::new(build_registry(&config.tools, &ctx)?);
    debug!(tools = tools.len(), model = %model, "Agent assembled");

    let system_prompt = config
        .agent
        .system_prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    let mut graph = AgentGraph::new(provider, model, tools, memory)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_system_prompt(system_prompt)
        .with_recursion_limit(config.agent.recursion_limit)
        .with_recall_limit(config.memory.recall_limit)
        .with_preview_chars(config.memory.preview_chars);
    if let Some(checkpointer) = checkpointer(config) {
        graph = graph.with_checkpointer(checkpointer);
    }
    Ok(graph)
}
