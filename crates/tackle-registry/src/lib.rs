//! # Tackle Registry
//!
//! Registry resolution for the tackle tool-version manager.
//!
//! This crate turns the registry descriptors of a project configuration into
//! parsed package catalogs on local disk, touching the network only when no
//! cached copy exists.
//!
//! ## Features
//!
//! - **Bounded parallelism**: registries are resolved concurrently, at most
//!   `max_parallelism` at a time
//! - **Disk cache**: a fetched catalog is stored at a deterministic path and
//!   trusted on every later run
//! - **Two-tier fetch**: raw content download first, authenticated GitHub
//!   content API as fallback
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tackle_core::Config;
//! use tackle_registry::{ClientConfig, RegistryInstaller};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config_path = Path::new("tackle.yaml");
//!     let config = Config::from_file(config_path)?;
//!
//!     let client = ClientConfig::default().with_max_parallelism(4);
//!     let installer = RegistryInstaller::from_config(&client)?;
//!
//!     let contents = installer
//!         .install(&config.registries, config.inline_registry, config_path)
//!         .await?;
//!     for (name, content) in &contents {
//!         println!("{name}: {} packages", content.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   RegistryInstaller                         │
//! │        (one task per registry, semaphore-bounded)           │
//! └─────────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ContentAcquirer                           │
//! │        cache hit: load      cache miss: fetch + store       │
//! └─────────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 RemoteContentFetcher                        │
//! │  ┌─────────────────────┐      ┌──────────────────────────┐  │
//! │  │   HttpDownloader    │ ───▶ │      GitHubClient        │  │
//! │  │   (raw content)     │ fail │   (content API, token)   │  │
//! │  └─────────────────────┘      └──────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod acquirer;
mod config;
mod error;
mod fetcher;
mod github;
mod http;
mod installer;

pub use acquirer::ContentAcquirer;
pub use config::{ClientConfig, DEFAULT_GITHUB_API_URL, DEFAULT_RAW_CONTENT_URL};
pub use error::{RegistryError, Result};
pub use fetcher::{ContentFetcher, ContentLocation, RemoteContentFetcher};
pub use github::{ContentEntry, GitHubClient, Release, RepositoryContent, RepositoryService};
pub use http::{HttpDownloader, RawDownloader};
pub use installer::{RegistryContents, RegistryInstaller, INLINE_REGISTRY_NAME};
