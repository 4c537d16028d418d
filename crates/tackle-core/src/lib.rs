//! # Tackle Core
//!
//! Core types for the tackle tool-version manager.
//!
//! This crate provides the data structures shared by the registry resolver
//! and the command-line interface:
//!
//! - [`Registry`] - Canonical registry descriptor, with validation and
//!   on-disk location rules
//! - [`RawRegistry`] - Registry descriptor as written in configuration
//! - [`RegistryContent`] - Parsed package catalog served by a registry
//! - [`Config`] - Project configuration file
//! - [`validation`] - Catalog content checks
//!
//! ## Example
//!
//! ```rust
//! use std::path::Path;
//! use tackle_core::Config;
//!
//! let config = Config::from_yaml_slice(b"registries:\n- type: standard\n  ref: v4.0.0\n").unwrap();
//! config.validate().unwrap();
//!
//! let path = config.registries[0]
//!     .cache_path(Path::new("/home/me/.local/share/tackle"), Path::new("tackle.yaml"))
//!     .unwrap();
//! assert!(path.ends_with("aquaproj/aqua-registry/v4.0.0/registry.yaml"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod content;
pub mod error;
pub mod registry;
pub mod validation;


pub use config::{Config, PackageRef, CONFIG_FILE_NAMES};
pub use content::{FileInfo, PackageInfo, RegistryContent};
pub use error::{Error, Result};
pub use registry::{RawRegistry, Registry, RegistryConfigError, RegistryType};
pub use validation::{Validate, ValidationError, ValidationErrors};
