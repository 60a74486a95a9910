//! murmur command-line entry point.

mod replay;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use murmur_core::config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "murmur")]
#[command(version = "0.1")]
#[command(about = "Conversational chat client core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(long, value_name = "PATH", default_value = "murmur.toml")]
    config: PathBuf,

    /// Log level when MURMUR_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Replay inbound frames from stdin through the session pipeline
    Replay {
        /// Conversation uid to attribute the frames to
        #[arg(long, default_value = "local")]
        conversation: String,

        /// Print assistant text immediately instead of pacing it
        #[arg(long)]
        no_pacing: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("MURMUR_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load_from(&cli.config)?;

    match cli.command {
        Commands::Replay {
            conversation,
            no_pacing,
        } => replay::run(&config, &conversation, no_pacing).await,
    }
}
