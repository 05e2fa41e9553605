//! Subcommand implementations.

pub mod chat;
pub mod clients;
pub mod doctor;
pub mod experiments;
pub mod init;
pub mod query;
pub mod route;
pub mod serve;
pub mod status;
pub mod tools;
pub mod version;

use askpanda_config::AppConfig;

/// Load config and apply an `--experiment` override, rejecting unknown names.
pub fn load_config(experiment: Option<String>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(name) = experiment {
        config.experiment.name = name;
    }
    let profile = askpanda_experiments::lookup(&config.experiment.name)?;
    config.experiment.name = profile.name.to_string();
    tracing::debug!(experiment = %config.experiment.name, provider = config.model.provider.as_str(), "Config loaded");
    Ok(config)
}

/// Print setup help when the OpenAI backend has no key.
pub fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.model.provider != askpanda_config::ModelBackend::OpenAi || config.has_api_key() {
        return Ok(());
    }
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    OPENAI_API_KEY=sk-...");
    eprintln!("    API_KEY=sk-...");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    eprintln!("  To use a local model instead: MODEL_PROVIDER=ollama MODEL_NAME=llama3");
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}
