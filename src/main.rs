use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quick_rag::commands::{run_console, run_ingest, show_status};
use quick_rag::config::{Config, DEFAULT_CONFIG_DIR, run_interactive_config, show_config};
use quick_rag::server::serve;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quick-rag")]
#[command(about = "Ask questions about a folder of JSON documents using retrieval-augmented generation")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding server, LLM and paths
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Load the dataset and build the vector store
    Ingest {
        /// Dataset directory, overriding paths.dataset_dir
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Clear the existing store before ingesting
        #[arg(long)]
        rebuild: bool,
    },
    /// Ask questions interactively on the console
    Ask,
    /// Start the web chat server
    Serve {
        /// Bind host, overriding server.host
        #[arg(long)]
        host: Option<String>,
        /// Bind port, overriding server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show configuration and vector store status
    Status,
}

impl Commands {
    /// Log level used when RUST_LOG is unset
    fn default_log_level(&self) -> &'static str {
        match self {
            Commands::Serve { .. } => "info",
            _ => "warn",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.command.default_log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&cli.config_dir)?;
            } else {
                run_interactive_config(&cli.config_dir)?;
            }
        }
        Commands::Ingest { dataset, rebuild } => {
            let config = load_config(&cli.config_dir)?;
            run_ingest(&config, dataset, rebuild).await?;
        }
        Commands::Ask => {
            let config = load_config(&cli.config_dir)?;
            run_console(&config).await?;
        }
        Commands::Serve { host, port } => {
            let config = load_config(&cli.config_dir)?;
            serve(&config, host, port).await?;
        }
        Commands::Status => {
            let config = load_config(&cli.config_dir)?;
            show_status(&config).await?;
        }
    }

    Ok(())
}

fn load_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir).context("Failed to load configuration")
}
