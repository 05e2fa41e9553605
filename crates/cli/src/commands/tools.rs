//! `askpanda tools`: list or call the PanDA and documentation tools.

use askpanda_config::AppConfig;
use askpanda_core::tool::ToolCall;
use askpanda_tools::ToolServer;

fn registry(server: &str) -> Result<askpanda_core::tool::ToolRegistry, Box<dyn std::error::Error>> {
    let server: ToolServer = server.parse()?;
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(askpanda_tools::registry(server, &config.experiment.name))
}

pub async fn list(server: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry = registry(server)?;
    println!("Tools on the '{server}' server:\n");
    for definition in registry.definitions() {
        println!("  {:<22} {}", definition.name, definition.description);
    }
    Ok(())
}

pub async fn call(server: &str, name: &str, args: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry = registry(server)?;
    let arguments: serde_json::Value =
        serde_json::from_str(args).map_err(|e| format!("--args is not valid JSON: {e}"))?;

    let call = ToolCall {
        id: "cli".into(),
        name: name.to_string(),
        arguments,
    };
    let result = registry.execute(&call).await?;
    println!("{}", serde_json::to_string_pretty(&result.data)?);
    Ok(())
}
