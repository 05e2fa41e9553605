//! `askpanda route`: classify and route a question without calling the model.

use askpanda_clients::{ClientRouter, classify};
use askpanda_config::AppConfig;
use askpanda_core::client::ClientQuery;

pub async fn run(question: String, client: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = ClientRouter::from_config(&config.clients);

    match &client {
        Some(name) => println!("Target:     {name} (explicit)"),
        None => println!("Classified: {}", classify(&question)),
    }

    let query = ClientQuery::new(&question).with_experiment(&config.experiment.name);
    let routed = router.route(&query, client.as_deref()).await?;
    println!("Handled by: {}", routed.client);
    println!();
    println!("{}", serde_json::to_string_pretty(&routed)?);
    Ok(())
}
