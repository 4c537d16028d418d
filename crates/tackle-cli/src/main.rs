//! Tackle CLI - declarative CLI tool-version manager.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --log-level wins over RUST_LOG
    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(format!("tackle={level}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "tackle=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Install(args) => commands::install::execute(args).await,
        Commands::Init(args) => commands::init::execute(args).await,
        Commands::Version => {
            println!("tackle {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
