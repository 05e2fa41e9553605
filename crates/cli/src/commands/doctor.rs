//! `askpanda doctor`: diagnose configuration problems.

use askpanda_config::{AppConfig, ModelBackend};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Ask PanDA Doctor");
    println!("================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ok    Config file present");
    } else {
        println!("  warn  No config file; defaults in use (run `askpanda init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ok    Config valid");
            config
        }
        Err(e) => {
            println!("  FAIL  Config invalid: {e}");
            println!("\n  1 issue(s) found.");
            return Ok(());
        }
    };

    match askpanda_experiments::lookup(&config.experiment.name) {
        Ok(exp) => println!("  ok    Experiment '{}'", exp.name),
        Err(e) => {
            println!("  FAIL  {e}");
            issues += 1;
        }
    }

    match (config.model.provider, config.has_api_key()) {
        (ModelBackend::OpenAi, false) => {
            println!("  FAIL  OpenAI selected but no API key (set OPENAI_API_KEY)");
            issues += 1;
        }
        (backend, _) => println!("  ok    Model backend '{}'", backend.as_str()),
    }

    match askpanda_providers::build_from_config(&config.model) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  ok    Model endpoint reachable"),
            Ok(false) | Err(_) => {
                println!("  warn  Model endpoint did not answer the health check");
                issues += 1;
            }
        },
        Err(e) => println!("  skip  Endpoint check ({e})"),
    }

    let enabled = [
        config.clients.docs_enabled,
        config.clients.logs_enabled,
        config.clients.data_enabled,
        config.clients.pilots_enabled,
        config.clients.maintenance_enabled,
    ]
    .iter()
    .filter(|e| **e)
    .count();
    if enabled == 0 {
        println!("  FAIL  All domain clients disabled; every query will fail");
        issues += 1;
    } else {
        println!("  ok    {enabled} of 5 domain clients enabled");
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
