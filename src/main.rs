use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stocktalk::{cli, config::StocktalkConfig, server};

#[derive(Parser)]
#[command(
    name = "stocktalk",
    version,
    about = "Natural-language analytics over inventory and sales backends"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Ask a single question and print the answer
    Ask {
        /// The question, quoted
        question: String,
    },
    /// Interactive chat session
    Chat,
    /// Show the backend's search-index schema and tool list
    Schema,
    /// Show cache statistics from a running server
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = StocktalkConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for piped CLI output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Ask { question } => {
            cli::ask::ask(config, &question).await?;
        }
        Command::Chat => {
            cli::chat::chat(config).await?;
        }
        Command::Schema => {
            cli::schema::schema(config).await?;
        }
        Command::Stats => {
            cli::stats::stats(&config).await?;
        }
    }

    Ok(())
}
