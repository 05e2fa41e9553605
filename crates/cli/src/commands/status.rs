//! `askpanda status`: show configuration status.

use askpanda_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let base_url = config
        .model
        .base_url
        .clone()
        .unwrap_or_else(|| askpanda_providers::default_base_url(config.model.provider).to_string());

    println!("Ask PanDA Status");
    println!("================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Experiment:   {}", config.experiment.name);
    println!("  Provider:     {}", config.model.provider.as_str());
    println!("  Model:        {}", config.model.model_name);
    println!("  Endpoint:     {base_url}");
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "not set" });
    println!("  Temperature:  {}", config.model.temperature);
    println!("  Memory:       {} messages, {} token budget", config.memory.max_messages, config.memory.max_tokens);
    println!("  PanDA:        {} (timeout {}s)", config.clients.base_url, config.clients.timeout);
    println!("  Server:       {}:{}", config.server.host, config.server.port);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file; run `askpanda init` to create one");
    }

    Ok(())
}
