//! `askpanda query`: one routed question, answered by the model.

use askpanda_agent::Agent;

pub async fn run(
    question: String,
    experiment: Option<String>,
    client: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(experiment)?;
    super::require_api_key(&config)?;

    let agent = Agent::from_config(&config)?;
    let mut conversation = agent.new_conversation();

    if !json {
        println!("Query:      {question}");
        println!("Experiment: {}", agent.experiment().name);
        if let Some(client) = &client {
            println!("Client:     {client}");
        }
        eprint!("  Thinking...");
    }

    let outcome = agent
        .query(&mut conversation, &question, client.as_deref(), Default::default())
        .await;
    if !json {
        eprint!("\r              \r");
    }
    let outcome = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("Routed to:  {} ({})", outcome.client, outcome.client_data.response.source);
        println!();
        println!("{}", outcome.response);
    }
    Ok(())
}
