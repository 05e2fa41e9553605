//! `askpanda chat`: interactive or single-message chat.

use std::io::Write;

use askpanda_agent::Agent;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(experiment: Option<String>, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(experiment)?;
    super::require_api_key(&config)?;

    let agent = Agent::from_config(&config)?;
    let mut conversation = agent.new_conversation();

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let response = agent.chat(&mut conversation, &msg).await;
        eprint!("\r              \r");
        println!("{}", response?);
        return Ok(());
    }

    println!();
    println!("  Ask PanDA: {} chat session", agent.experiment().summary);
    println!();
    println!("  Provider:  {}", config.model.provider.as_str());
    println!("  Model:     {}", config.model.model_name);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'quit' or 'exit' to end the session.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        eprint!("  ...");
        match agent.chat(&mut conversation, input).await {
            Ok(response) => {
                eprint!("\r     \r");
                println!();
                for line in response.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
