//! Init command - writes a starter configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tackle_core::config::is_config_file_name;
use tackle_core::registry::{STANDARD_REPO_NAME, STANDARD_REPO_OWNER};
use tackle_core::CONFIG_FILE_NAMES;
use tackle_registry::{GitHubClient, RepositoryService};
use tracing::{info, warn};

use super::ClientArgs;

/// Standard registry version used when the latest release cannot be looked up.
pub const FALLBACK_REGISTRY_VERSION: &str = "v0.12.1";

const CONFIG_TEMPLATE: &str = "---
# tackle - Declarative CLI Version Manager
registries:
- type: standard
  ref: %%STANDARD_REGISTRY_VERSION%%

packages:
";

/// Arguments for the init command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path of the file to create
    #[arg(default_value = CONFIG_FILE_NAMES[0])]
    pub path: PathBuf,

    #[command(flatten)]
    pub client: ClientArgs,
}

/// Execute the init command.
pub async fn execute(args: InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get the current directory")?;
    let github = GitHubClient::new(&args.client.client_config())
        .context("Failed to create the GitHub client")?;

    if let Some(path) = init_config(&cwd, &args.path, &github).await? {
        println!("Created {}", path.display());
    }
    Ok(())
}

/// Writes the starter configuration to `path`, relative to `dir`.
///
/// Nothing is written if `path` already exists, or if `path` is one of the
/// well-known configuration names and any of those exists in `dir`. Returns
/// the written path.
pub async fn init_config(
    dir: &Path,
    path: &Path,
    github: &dyn RepositoryService,
) -> Result<Option<PathBuf>> {
    if path.to_str().is_some_and(is_config_file_name) {
        for name in CONFIG_FILE_NAMES {
            let existing = dir.join(name);
            if exists(&existing).await {
                info!(path = %existing.display(), "Configuration file already exists");
                return Ok(None);
            }
        }
    }

    let target = dir.join(path);
    if exists(&target).await {
        info!(path = %target.display(), "Configuration file already exists");
        return Ok(None);
    }

    let version = latest_registry_version(github).await;
    let body = CONFIG_TEMPLATE.replace("%%STANDARD_REGISTRY_VERSION%%", &version);
    tokio::fs::write(&target, body)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    info!(path = %target.display(), version = %version, "Created configuration file");
    Ok(Some(target))
}

async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

async fn latest_registry_version(github: &dyn RepositoryService) -> String {
    match github
        .get_latest_release(STANDARD_REPO_OWNER, STANDARD_REPO_NAME)
        .await
    {
        Ok(release) if !release.tag_name.is_empty() => release.tag_name,
        Ok(_) => {
            warn!(
                fallback = FALLBACK_REGISTRY_VERSION,
                "Latest standard registry release has no tag"
            );
            FALLBACK_REGISTRY_VERSION.to_string()
        }
        Err(e) => {
            warn!(
                error = %e,
                repo_owner = STANDARD_REPO_OWNER,
                repo_name = STANDARD_REPO_NAME,
                fallback = FALLBACK_REGISTRY_VERSION,
                "Failed to get the latest release of the standard registry"
            );
            FALLBACK_REGISTRY_VERSION.to_string()
        }
    }
}
