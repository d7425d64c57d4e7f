//! `blitzcoder search`: query a user's memories directly.

use blitzcoder_agent::format_search_results;
use blitzcoder_core::memory::Namespace;

use super::runtime;

pub async fn run(query: &str, user_id: &str, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config()?;
    let (provider, _) = runtime::provider(&config)?;
    let store = runtime::memory_store(&config, runtime::embedder(&config, &provider));

    let results = store.search(&Namespace::memories(user_id), query, limit).await?;
    println!("{}", format_search_results(query, &results));
    if results.is_empty() && config.memory.backend == "in_memory" {
        println!("  (memory.backend is in_memory; set it to \"file\" to keep memories between runs)");
    }
    Ok(())
}
