//! `askpanda clients`: show the routing table.

use askpanda_clients::ClientRouter;
use askpanda_config::AppConfig;
use askpanda_core::client::ClientKind;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = ClientRouter::from_config(&config.clients);

    println!("Domain clients ({}, timeout {}s):\n", config.clients.base_url, config.clients.timeout);
    for kind in ClientKind::ALL {
        let state = if router.get(kind).is_some() { "enabled" } else { "disabled" };
        println!("  {:<12} {:<14} {state}", kind.as_str(), kind.source());
    }
    Ok(())
}
