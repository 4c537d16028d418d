//! Error types for tackle core operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::RegistryConfigError;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigLoad {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for the expected schema.
    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigParse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A registry descriptor failed validation.
    #[error("Invalid registry: {source}")]
    InvalidRegistry {
        /// The violated requirement.
        #[from]
        source: RegistryConfigError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_registry() {
        let err = Error::from(RegistryConfigError::RefRequired {
            name: "standard".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Invalid registry: registry 'standard': ref is required"
        );
    }

    #[test]
    fn test_error_display_config_load() {
        let err = Error::ConfigLoad {
            path: PathBuf::from("/work/tackle.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().starts_with("Failed to read configuration file /work/tackle.yaml"));
    }
}
