//! `askpanda serve`: start the HTTP API server.

pub async fn run(
    host: Option<String>,
    port: Option<u16>,
    experiment: Option<String>,
    debug: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(experiment)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.server.debug |= debug;
    config.validate()?;
    super::require_api_key(&config)?;

    println!("Starting Ask PanDA API server...");
    println!("  Listening:          http://{}:{}/api/v1", config.server.host, config.server.port);
    println!("  Default experiment: {}", config.experiment.name);
    println!("  Debug mode:         {}", config.server.debug);

    askpanda_gateway::start(config).await
}
