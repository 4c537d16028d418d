//! Error types for registry resolution.

use std::path::PathBuf;

use tackle_core::ValidationErrors;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while resolving registries.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The raw download failed and no GitHub API client is configured.
    #[error("GitHub access token is required to read the content via the GitHub API")]
    GitHubTokenRequired,

    /// The GitHub content API returned something other than a single file.
    #[error("{repo_owner}/{repo_name}/{path}@{git_ref} must be a file")]
    ContentMustBeFile {
        /// Repository owner.
        repo_owner: String,
        /// Repository name.
        repo_name: String,
        /// Path inside the repository.
        path: String,
        /// Git ref.
        git_ref: String,
    },

    /// A local registry's catalog file does not exist.
    #[error("local registry '{name}' is not found at {path}")]
    LocalRegistryNotFound {
        /// Registry name.
        name: String,
        /// Expected catalog location.
        path: PathBuf,
    },

    /// The registry kind cannot be resolved.
    #[error("registry '{name}' has an unsupported type '{registry_type}'")]
    UnsupportedRegistryType {
        /// Registry name.
        name: String,
        /// Type tag.
        registry_type: String,
    },

    /// At least one registry failed to install. Causes are logged, not carried.
    #[error("failed to install {failed} of {total} registries")]
    InstallFailure {
        /// Number of failed registries.
        failed: usize,
        /// Number of registries attempted.
        total: usize,
    },

    /// A resolved catalog failed content validation.
    #[error("registry '{registry_name}' has invalid content: {source}")]
    InvalidContent {
        /// Registry name.
        registry_name: String,
        /// Every violated check.
        #[source]
        source: ValidationErrors,
    },

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A catalog file could not be parsed.
    #[error("Failed to parse registry content at {path}: {source}")]
    Parse {
        /// Catalog location.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// Failed to connect to a remote endpoint.
    #[error("Failed to connect to {url}: {source}")]
    ConnectionFailed {
        /// Requested URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success or failed HTTP exchange.
    #[error("HTTP error: {status} - {message}")]
    HttpError {
        /// HTTP status code, 0 when no response was received.
        status: u16,
        /// Error message.
        message: String,
    },

    /// JSON decoding of an API response failed.
    #[error("JSON error: {source}")]
    Json {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Content returned by the GitHub API could not be decoded.
    #[error("Failed to decode content of {path}: {message}")]
    ContentDecode {
        /// Path inside the repository.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// Client configuration is unusable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else {
            Self::HttpError {
                status: err.status().map_or(0, |s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json { source: err }
    }
}
