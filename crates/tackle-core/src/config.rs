//! Project configuration files.
//!
//! A configuration file lists the registries a project draws packages from,
//! an optional inline catalog, and the packages themselves:
//!
//! ```yaml
//! registries:
//! - type: standard
//!   ref: v4.0.0
//! - name: corp
//!   type: local
//!   path: registry.yaml
//!
//! packages:
//! - name: cli/cli@v2.40.0
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::content::RegistryContent;
use crate::error::{Error, Result};
use crate::registry::{RawRegistry, Registry, STANDARD_REGISTRY_NAME};

/// File names recognized as a project configuration, in lookup order.
pub const CONFIG_FILE_NAMES: [&str; 4] = ["tackle.yaml", "tackle.yml", ".tackle.yaml", ".tackle.yml"];

/// Returns true if `name` is one of [`CONFIG_FILE_NAMES`].
#[must_use]
pub fn is_config_file_name(name: &str) -> bool {
    CONFIG_FILE_NAMES.contains(&name)
}

/// Searches `start` and its ancestors for a configuration file.
#[must_use]
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Configuration as decoded, before registry normalization.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    registries: Option<Vec<RawRegistry>>,
    #[serde(default)]
    inline_registry: Option<RegistryContent>,
    #[serde(default)]
    packages: Option<Vec<PackageRef>>,
}

/// A package requested by the project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageRef {
    /// Package name, optionally suffixed with `@<version>`.
    pub name: String,

    /// Registry to look the package up in.
    #[serde(default = "default_registry_name")]
    pub registry: String,

    /// Version, when not given in `name`.
    #[serde(default)]
    pub version: Option<String>,
}

fn default_registry_name() -> String {
    STANDARD_REGISTRY_NAME.to_string()
}

/// A validated project configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Registries in declaration order.
    pub registries: Vec<Registry>,

    /// Catalog embedded in the configuration itself.
    pub inline_registry: Option<RegistryContent>,

    /// Requested packages.
    pub packages: Vec<PackageRef>,
}

impl Config {
    /// Reads, normalizes and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any
    /// registry descriptor is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_slice(&bytes).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            registries = config.registries.len(),
            packages = config.packages.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Decodes and normalizes a configuration without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` does not match the configuration schema.
    pub fn from_yaml_slice(bytes: &[u8]) -> std::result::Result<Self, serde_yaml::Error> {
        let raw: RawConfig = serde_yaml::from_slice(bytes)?;
        Ok(Self {
            registries: raw
                .registries
                .unwrap_or_default()
                .into_iter()
                .map(Registry::normalize)
                .collect(),
            inline_registry: raw.inline_registry,
            packages: raw.packages.unwrap_or_default(),
        })
    }

    /// Validates every registry descriptor in order.
    ///
    /// # Errors
    ///
    /// Returns the first invalid descriptor's error.
    pub fn validate(&self) -> Result<()> {
        for registry in &self.registries {
            registry.validate().inspect_err(|e| {
                tracing::debug!(
                    registry_name = e.registry_name().unwrap_or_default(),
                    error = %e,
                    "Invalid registry"
                );
            })?;
        }
        Ok(())
    }
}
