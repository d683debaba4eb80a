use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kokobot::Result;
use kokobot::commands::{run_ask, run_index, run_serve, run_status};
use kokobot::config::{run_interactive_config, show_config};

#[derive(Debug, Parser)]
#[command(name = "kokobot")]
#[command(about = "Retrieval-augmented chatbot for the kokomo.house blog")]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to ./kokobot.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Configure API and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the vector store from the blog content
    Index,
    /// Ask a single question on the command line
    Ask {
        /// The question to answer
        query: String,
    },
    /// Start the HTTP chat server
    Serve,
    /// Show the state of the vector store
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(config_path)?;
            } else {
                run_interactive_config(config_path)?;
            }
        }
        Commands::Index => {
            run_index(config_path).await?;
        }
        Commands::Ask { query } => {
            run_ask(config_path, &query).await?;
        }
        Commands::Serve => {
            run_serve(config_path).await?;
        }
        Commands::Status => {
            run_status(config_path).await?;
        }
    }

    Ok(())
}
