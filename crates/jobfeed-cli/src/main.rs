use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobfeed_core::{AppConfig, JobStore};

mod commands;

#[derive(Parser)]
#[command(name = "jobfeed")]
#[command(author, version, about = "Collects job board RSS feeds into a deduplicated JSON job list")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.config/jobfeed/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Job list file, overriding `general.store_path`
    #[arg(short = 's', long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all sources and merge new jobs into the job list
    Ingest,
    /// Remove expired jobs from the job list
    Reap,
    /// Show stored jobs and how long they stay listed
    List,
    /// Show configured sources
    Sources,
    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);

    // Load configuration
    let config = AppConfig::load_from(&config_path)?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let store = JobStore::new(cli.store.unwrap_or_else(|| config.store_path()));

    match cli.command {
        Commands::Ingest => commands::ingest::run(&config, &store).await,
        Commands::Reap => commands::reap::run(&store),
        Commands::List => commands::list::run(&store),
        Commands::Sources => commands::sources::run(&config),
        Commands::Init => commands::init::run(&config_path),
    }
}
