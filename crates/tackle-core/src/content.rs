//! Catalog content served by a registry.
//!
//! The package records are consumed by the installation pipeline; this crate
//! only decodes them, keeps unknown keys intact and checks the few fields
//! every package needs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationError, ValidationErrors};

/// A parsed catalog.
///
/// # Examples
///
/// ```
/// use tackle_core::{RegistryContent, Validate};
///
/// let content = RegistryContent::from_yaml_slice(
///     b"packages:\n- type: github_release\n  repo_owner: cli\n  repo_name: cli\n  asset: gh.tar.gz\n",
/// )
/// .unwrap();
///
/// assert_eq!(content.len(), 1);
/// assert_eq!(content.packages[0].resolved_name().as_deref(), Some("cli/cli"));
/// assert!(content.is_valid());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryContent {
    /// Package definitions in catalog order.
    #[serde(default)]
    pub packages: Vec<PackageInfo>,
}

impl RegistryContent {
    /// Creates a catalog from package definitions.
    #[must_use]
    pub const fn new(packages: Vec<PackageInfo>) -> Self {
        Self { packages }
    }

    /// Decodes a YAML catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a YAML catalog.
    pub fn from_yaml_slice(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(bytes)
    }

    /// Number of packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns true if the catalog has no packages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl Validate for RegistryContent {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (i, package) in self.packages.iter().enumerate() {
            if let Err(package_errors) = package.validate() {
                errors.merge_nested(&format!("packages[{i}]"), package_errors);
            }
        }
        errors.into_result()
    }
}

/// One package definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// How the package is distributed, e.g. `github_release` or `http`.
    #[serde(rename = "type", default)]
    pub package_type: String,

    /// Explicit package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Source repository owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_owner: Option<String>,

    /// Source repository name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,

    /// Release asset template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,

    /// Path inside a repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Download URL template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Archive format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Homepage link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Executables provided by the package.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileInfo>,

    /// Every other key, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl PackageInfo {
    /// Returns the explicit name, or `repo_owner/repo_name` when both are set.
    #[must_use]
    pub fn resolved_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        match (self.repo_owner.as_deref(), self.repo_name.as_deref()) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
                Some(format!("{owner}/{repo}"))
            }
            _ => None,
        }
    }
}

impl Validate for PackageInfo {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.package_type.is_empty() {
            errors.add(ValidationError::required("type"));
        }
        if self.resolved_name().is_none() {
            errors.add(ValidationError::constraint(
                "name",
                "either 'name' or both 'repo_owner' and 'repo_name' must be set",
            ));
        }
        for (i, file) in self.files.iter().enumerate() {
            if file.name.is_empty() {
                errors.add(ValidationError::required(format!("files[{i}].name")));
            }
        }

        errors.into_result()
    }
}

/// An executable shipped by a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Command name.
    #[serde(default)]
    pub name: String,

    /// Path of the executable inside the downloaded artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}
