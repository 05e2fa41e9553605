//! Ask PanDA CLI, the main entry point.
//!
//! Commands:
//! - `query`            Ask a question, routed to a PanDA domain client
//! - `route`            Show which client a question goes to, without the model
//! - `chat`             Interactive or single-message chat
//! - `serve`            Start the HTTP API server
//! - `list-experiments` List supported experiments
//! - `clients`          Show domain clients and whether they are enabled
//! - `tools`            List or call the PanDA and documentation tools
//! - `status`           Show configuration status
//! - `init`             Write a default config file
//! - `doctor`           Diagnose configuration problems
//! - `version`          Show version information

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "askpanda",
    about = "Ask PanDA: a smart assistant for PanDA workflows",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question about PanDA workflows
    Query {
        /// The question to ask
        question: String,

        /// Experiment to query
        #[arg(short, long)]
        experiment: Option<String>,

        /// Specific client to use (docs, logs, data, pilots, maintenance)
        #[arg(short, long)]
        client: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which client handles a question and what it returns
    Route {
        /// The question to route
        question: String,

        /// Route to this client instead of classifying
        #[arg(short, long)]
        client: Option<String>,
    },

    /// Chat with the assistant
    Chat {
        /// Experiment to chat with
        #[arg(short, long)]
        experiment: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Default experiment
        #[arg(short, long)]
        experiment: Option<String>,

        /// Enable debug mode
        #[arg(short, long)]
        debug: bool,
    },

    /// List available experiments
    ListExperiments,

    /// Show domain clients
    Clients,

    /// List or call tools
    Tools {
        /// Tool set: panda or docs
        #[arg(long, default_value = "panda")]
        server: String,

        #[command(subcommand)]
        action: Option<ToolsAction>,
    },

    /// Show configuration status
    Status,

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Diagnose configuration problems
    Doctor,

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ToolsAction {
    /// Call a tool by name
    Call {
        /// Tool name
        name: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Commands print their own output; only the server logs at info.
    let filter = match &cli.command {
        _ if cli.verbose => "debug",
        Commands::Serve { debug: true, .. } => "debug",
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Query {
            question,
            experiment,
            client,
            json,
        } => commands::query::run(question, experiment, client, json).await?,
        Commands::Route { question, client } => commands::route::run(question, client).await?,
        Commands::Chat { experiment, message } => commands::chat::run(experiment, message).await?,
        Commands::Serve {
            host,
            port,
            experiment,
            debug,
        } => commands::serve::run(host, port, experiment, debug).await?,
        Commands::ListExperiments => commands::experiments::run().await?,
        Commands::Clients => commands::clients::run().await?,
        Commands::Tools { server, action } => match action {
            None => commands::tools::list(&server).await?,
            Some(ToolsAction::Call { name, args }) => commands::tools::call(&server, &name, &args).await?,
        },
        Commands::Status => commands::status::run().await?,
        Commands::Init { force } => commands::init::run(force).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Version => commands::version::run(),
    }

    Ok(())
}
