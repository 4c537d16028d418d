//! Registry descriptors.
//!
//! A registry is a named source of a package catalog. Descriptors are decoded
//! from configuration as [`RawRegistry`] values and turned into canonical
//! [`Registry`] values by [`Registry::normalize`]. The `standard` shorthand is
//! expanded there, so nothing downstream ever sees it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default name given to a `standard` registry that has no explicit name.
pub const STANDARD_REGISTRY_NAME: &str = "standard";

/// Owner of the repository hosting the standard registry.
pub const STANDARD_REPO_OWNER: &str = "aquaproj";

/// Name of the repository hosting the standard registry.
pub const STANDARD_REPO_NAME: &str = "aqua-registry";

/// Path of the catalog file inside the standard registry repository.
pub const STANDARD_REGISTRY_PATH: &str = "registry.yaml";

/// Errors raised while validating a registry descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryConfigError {
    /// The descriptor has no name.
    #[error("registry name is required")]
    NameRequired,

    /// The descriptor type is not one of the recognized types.
    #[error("registry '{name}' has an invalid type '{registry_type}'")]
    InvalidRegistryType {
        /// Registry name.
        name: String,
        /// The unrecognized type tag.
        registry_type: String,
    },

    /// A `path` is required but was empty.
    #[error("registry '{name}': path is required")]
    PathRequired {
        /// Registry name.
        name: String,
    },

    /// A `github_content` registry has no `repo_owner`.
    #[error("registry '{name}': repo_owner is required")]
    RepoOwnerRequired {
        /// Registry name.
        name: String,
    },

    /// A `github_content` registry has no `repo_name`.
    #[error("registry '{name}': repo_name is required")]
    RepoNameRequired {
        /// Registry name.
        name: String,
    },

    /// A `github_content` registry has no `ref`.
    #[error("registry '{name}': ref is required")]
    RefRequired {
        /// Registry name.
        name: String,
    },
}

impl RegistryConfigError {
    /// Returns the name of the offending registry, if it had one.
    #[must_use]
    pub fn registry_name(&self) -> Option<&str> {
        match self {
            Self::NameRequired => None,
            Self::InvalidRegistryType { name, .. }
            | Self::PathRequired { name }
            | Self::RepoOwnerRequired { name }
            | Self::RepoNameRequired { name }
            | Self::RefRequired { name } => Some(name),
        }
    }
}

/// Kind of a canonical registry.
///
/// `Unknown` keeps an unrecognized tag from configuration so that
/// [`Registry::validate`] can report it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistryType {
    /// A catalog file on the local filesystem.
    Local,
    /// A catalog file hosted in a GitHub repository.
    GitHubContent,
    /// Any other tag found in configuration.
    Unknown(String),
}

impl RegistryType {
    /// Tag for [`RegistryType::Local`].
    pub const LOCAL: &'static str = "local";
    /// Tag for [`RegistryType::GitHubContent`].
    pub const GITHUB_CONTENT: &'static str = "github_content";
    /// Shorthand tag rewritten by [`Registry::normalize`].
    pub const STANDARD: &'static str = "standard";

    /// Parses a configuration tag. `standard` is not a stored kind and maps
    /// to `Unknown` here; use [`Registry::normalize`] for raw input.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            Self::LOCAL => Self::Local,
            Self::GITHUB_CONTENT => Self::GitHubContent,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the configuration tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local => Self::LOCAL,
            Self::GitHubContent => Self::GITHUB_CONTENT,
            Self::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registry descriptor exactly as it appears in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRegistry {
    /// Registry name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Type tag: `local`, `github_content` or `standard`.
    #[serde(rename = "type")]
    pub registry_type: String,

    /// Repository owner (`github_content`).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repo_owner: String,

    /// Repository name (`github_content`).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub repo_name: String,

    /// Git ref (`github_content`, `standard`).
    #[serde(rename = "ref", skip_serializing_if = "String::is_empty")]
    pub git_ref: String,

    /// Catalog file path.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
}

/// A canonical, immutable registry descriptor.
///
/// # Examples
///
/// ```
/// use tackle_core::{RawRegistry, Registry, RegistryType};
///
/// let raw: RawRegistry = serde_yaml::from_str("type: standard\nref: v4.0.0").unwrap();
/// let registry = Registry::normalize(raw);
///
/// assert_eq!(registry.name(), "standard");
/// assert_eq!(registry.registry_type(), &RegistryType::GitHubContent);
/// assert_eq!(registry.repo_owner(), "aquaproj");
/// assert!(registry.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    name: String,
    registry_type: RegistryType,
    repo_owner: String,
    repo_name: String,
    git_ref: String,
    path: String,
}

impl Registry {
    /// Creates a local registry reading the catalog at `path`.
    #[must_use]
    pub fn local(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry_type: RegistryType::Local,
            repo_owner: String::new(),
            repo_name: String::new(),
            git_ref: String::new(),
            path: path.into(),
        }
    }

    /// Creates a registry backed by a file in a GitHub repository.
    #[must_use]
    pub fn github_content(
        name: impl Into<String>,
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
        git_ref: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            registry_type: RegistryType::GitHubContent,
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            git_ref: git_ref.into(),
            path: path.into(),
        }
    }

    /// Creates the standard registry pinned at `git_ref`.
    #[must_use]
    pub fn standard(git_ref: impl Into<String>) -> Self {
        Self::github_content(
            STANDARD_REGISTRY_NAME,
            STANDARD_REPO_OWNER,
            STANDARD_REPO_NAME,
            git_ref,
            STANDARD_REGISTRY_PATH,
        )
    }

    /// Turns a raw descriptor into a canonical one.
    ///
    /// A `standard` descriptor becomes a `github_content` descriptor pointing
    /// at the well-known catalog, named `standard` unless a name was given.
    /// Its `repo_owner`, `repo_name` and `path` are always overwritten.
    #[must_use]
    pub fn normalize(raw: RawRegistry) -> Self {
        if raw.registry_type == RegistryType::STANDARD {
            let name = if raw.name.is_empty() {
                STANDARD_REGISTRY_NAME.to_string()
            } else {
                raw.name
            };
            return Self::github_content(
                name,
                STANDARD_REPO_OWNER,
                STANDARD_REPO_NAME,
                raw.git_ref,
                STANDARD_REGISTRY_PATH,
            );
        }

        Self {
            name: raw.name,
            registry_type: RegistryType::parse(&raw.registry_type),
            repo_owner: raw.repo_owner,
            repo_name: raw.repo_name,
            git_ref: raw.git_ref,
            path: raw.path,
        }
    }

    /// Registry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry kind.
    #[must_use]
    pub const fn registry_type(&self) -> &RegistryType {
        &self.registry_type
    }

    /// Repository owner; empty for local registries.
    #[must_use]
    pub fn repo_owner(&self) -> &str {
        &self.repo_owner
    }

    /// Repository name; empty for local registries.
    #[must_use]
    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    /// Git ref; empty for local registries.
    #[must_use]
    pub fn git_ref(&self) -> &str {
        &self.git_ref
    }

    /// Catalog file path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checks the required fields for this registry's kind.
    ///
    /// # Errors
    ///
    /// Returns the first violated requirement.
    pub fn validate(&self) -> Result<(), RegistryConfigError> {
        if self.name.is_empty() {
            return Err(RegistryConfigError::NameRequired);
        }
        let name = || self.name.clone();

        match &self.registry_type {
            RegistryType::Local => {
                if self.path.is_empty() {
                    return Err(RegistryConfigError::PathRequired { name: name() });
                }
            }
            RegistryType::GitHubContent => {
                if self.repo_owner.is_empty() {
                    return Err(RegistryConfigError::RepoOwnerRequired { name: name() });
                }
                if self.repo_name.is_empty() {
                    return Err(RegistryConfigError::RepoNameRequired { name: name() });
                }
                if self.git_ref.is_empty() {
                    return Err(RegistryConfigError::RefRequired { name: name() });
                }
                if self.path.is_empty() {
                    return Err(RegistryConfigError::PathRequired { name: name() });
                }
            }
            RegistryType::Unknown(tag) => {
                return Err(RegistryConfigError::InvalidRegistryType {
                    name: name(),
                    registry_type: tag.clone(),
                });
            }
        }

        Ok(())
    }

    /// Returns where this registry's catalog lives on disk.
    ///
    /// Local registries resolve `path` against the directory of the owning
    /// configuration file unless it is absolute. GitHub registries live under
    /// `<root_dir>/registries/github_content/github.com/<owner>/<repo>/<ref>/<path>`.
    /// Returns `None` for unknown kinds.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use tackle_core::Registry;
    ///
    /// let registry = Registry::local("mine", "registry.yaml");
    /// assert_eq!(
    ///     registry.cache_path(Path::new("/root"), Path::new("/work/tackle.yaml")),
    ///     Some(PathBuf::from("/work/registry.yaml"))
    /// );
    /// ```
    #[must_use]
    pub fn cache_path(&self, root_dir: &Path, config_file_path: &Path) -> Option<PathBuf> {
        match &self.registry_type {
            RegistryType::Local => {
                let path = Path::new(&self.path);
                if path.is_absolute() {
                    return Some(path.to_path_buf());
                }
                let base = config_file_path.parent().unwrap_or_else(|| Path::new(""));
                Some(base.join(path))
            }
            RegistryType::GitHubContent => Some(
                root_dir
                    .join("registries")
                    .join(RegistryType::GITHUB_CONTENT)
                    .join("github.com")
                    .join(&self.repo_owner)
                    .join(&self.repo_name)
                    .join(&self.git_ref)
                    // stays under the ref directory even if written as "/x.yaml"
                    .join(self.path.trim_start_matches('/')),
            ),
            RegistryType::Unknown(_) => None,
        }
    }
}

impl From<RawRegistry> for Registry {
    fn from(raw: RawRegistry) -> Self {
        Self::normalize(raw)
    }
}
