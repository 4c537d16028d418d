//! CLI commands and argument parsing.

pub mod init;
pub mod install;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tackle_registry::ClientConfig;

/// Tackle - declarative CLI tool-version manager
#[derive(Parser)]
#[command(name = "tackle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, env = "TACKLE_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve and cache the registries of a configuration file
    Install(install::InstallArgs),

    /// Create a configuration file
    Init(init::InitArgs),

    /// Print version information
    Version,
}

/// Options shared by commands that talk to registries.
#[derive(Args, Debug, Default)]
pub struct ClientArgs {
    /// Root directory of the registry cache
    #[arg(long, env = "TACKLE_ROOT_DIR")]
    pub root_dir: Option<PathBuf>,

    /// Maximum number of registries resolved at the same time (default: CPU count)
    #[arg(long, env = "TACKLE_MAX_PARALLELISM")]
    pub max_parallelism: Option<usize>,

    /// GitHub access token, enables the GitHub API fallback
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

impl ClientArgs {
    /// Builds the registry client configuration.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = match &self.root_dir {
            Some(dir) => ClientConfig::new(dir),
            None => ClientConfig::default(),
        }
        .with_timeout(Duration::from_secs(self.timeout));

        if let Some(max_parallelism) = self.max_parallelism {
            config = config.with_max_parallelism(max_parallelism);
        }
        if let Some(token) = &self.github_token {
            config = config.with_github_token(token);
        }
        config
    }
}
