//! Install command - resolves and caches the registries of a configuration.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use tackle_core::config::find_config_file;
use tackle_core::Config;
use tackle_registry::RegistryInstaller;
use tracing::info;

use super::ClientArgs;

/// Arguments for the install command.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Configuration file (default: searched from the current directory up)
    #[arg(short, long, env = "TACKLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub client: ClientArgs,
}

/// Execute the install command.
pub async fn execute(args: InstallArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get the current directory")?;
    let config_path = resolve_config_path(args.config.as_deref(), &cwd)?;

    info!(config = %config_path.display(), "Installing registries");

    let config = Config::from_file(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let client = args.client.client_config();
    let installer =
        RegistryInstaller::from_config(&client).context("Failed to create the registry installer")?;

    let contents = installer
        .install(&config.registries, config.inline_registry, &config_path)
        .await
        .context("Failed to install registries")?;

    for (name, content) in &contents {
        println!("{name}: {} packages", content.len());
    }

    Ok(())
}

/// Picks the explicit configuration file, or the nearest one above `cwd`.
fn resolve_config_path(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.is_absolute() => Ok(path.to_path_buf()),
        Some(path) => Ok(cwd.join(path)),
        None => find_config_file(cwd).ok_or_else(|| {
            anyhow!(
                "No configuration file found in {} or its parents, run `tackle init` to create one",
                cwd.display()
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_relative_path_is_joined() {
        let path = resolve_config_path(Some(Path::new("cfg/tackle.yaml")), Path::new("/work")).unwrap();
        assert_eq!(path, PathBuf::from("/work/cfg/tackle.yaml"));
    }

    #[test]
    fn test_explicit_absolute_path_is_kept() {
        let path = resolve_config_path(Some(Path::new("/etc/tackle.yaml")), Path::new("/work")).unwrap();
        assert_eq!(path, PathBuf::from("/etc/tackle.yaml"));
    }

    #[test]
    fn test_discovers_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("tackle.yaml"), "registries: []\n").unwrap();

        let path = resolve_config_path(None, &nested).unwrap();
        assert_eq!(path, dir.path().join("tackle.yaml"));
    }

    #[test]
    fn test_missing_config_suggests_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_config_path(None, dir.path()).unwrap_err();
        assert!(err.to_string().contains("tackle init"));
    }
}
