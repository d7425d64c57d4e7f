//! `blitzcoder config`: configuration management commands.

use blitzcoder_config::AppConfig;

use super::runtime;

const REDACTED: &str = "***";

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating {}", AppConfig::config_path().display());

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");
            if !config.has_api_key() {
                println!("   Warning: no API key set (GROQ_API_KEY, OPENAI_API_KEY, OPENROUTER_API_KEY or BLITZCODER_API_KEY)");
            }
            println!();
            println!("   Provider:    {}", config.default_provider);
            println!("   Model:       {}", config.default_model);
            println!("   Memory:      {} ({} embeddings)", config.memory.backend, config.memory.embedding_provider);
            println!("   Checkpoint:  {}", config.agent.checkpoint);
            println!("   Recursion:   {} model calls per turn", config.agent.recursion_limit);
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = redacted(runtime::load_config()?);
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = AppConfig::config_path();
    if path.exists() && !force {
        println!("Config already exists at {} (use --force to overwrite)", path.display());
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn redacted(mut config: AppConfig) -> AppConfig {
    if config.api_key.is_some() {
        config.api_key = Some(REDACTED.into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.into());
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_path();
        assert!(path.to_str().unwrap().ends_with("config.toml"));
    }

    #[test]
    fn keys_never_shown() {
        let mut config = AppConfig::default();
        config.api_key = Some("gsk_secret".into());
        config.providers.insert(
            "openai".into(),
            blitzcoder_config::ProviderConfig {
                api_key: Some("sk-secret".into()),
                api_url: None,
                default_model: None,
            },
        );
        let text = toml::to_string_pretty(&redacted(config)).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains(REDACTED));
    }
}
