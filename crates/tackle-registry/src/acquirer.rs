//! Resolving one registry to its catalog.
//!
//! The catalog location on disk doubles as the cache key. If the file exists
//! it is parsed and trusted as-is. Otherwise a local registry is an error and
//! a GitHub registry is fetched, written to that location, and parsed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tackle_core::{Registry, RegistryContent, RegistryType};

use crate::error::{RegistryError, Result};
use crate::fetcher::{ContentFetcher, ContentLocation};

/// Resolves registries against an on-disk cache and a remote fetcher.
#[derive(Clone)]
pub struct ContentAcquirer {
    root_dir: PathBuf,
    fetcher: Arc<dyn ContentFetcher>,
}

impl std::fmt::Debug for ContentAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentAcquirer")
            .field("root_dir", &self.root_dir)
            .finish_non_exhaustive()
    }
}

impl ContentAcquirer {
    /// Creates an acquirer caching under `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            root_dir: root_dir.into(),
            fetcher,
        }
    }

    /// Root directory of the cache.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Returns the catalog of `registry`, declared in `config_file_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created, a cached
    /// file cannot be read or parsed, a local catalog is missing, or the
    /// remote fetch or the cache write fails. Nothing is retried.
    pub async fn acquire(
        &self,
        registry: &Registry,
        config_file_path: &Path,
    ) -> Result<RegistryContent> {
        let path = registry
            .cache_path(&self.root_dir, config_file_path)
            .ok_or_else(|| unsupported(registry))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| RegistryError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        if tokio::fs::metadata(&path).await.is_ok() {
            tracing::debug!(registry_name = registry.name(), path = %path.display(), "Cache hit");
            return load(&path).await;
        }

        match registry.registry_type() {
            RegistryType::Local => Err(RegistryError::LocalRegistryNotFound {
                name: registry.name().to_string(),
                path,
            }),
            RegistryType::GitHubContent => self.fetch_and_store(registry, &path).await,
            RegistryType::Unknown(_) => Err(unsupported(registry)),
        }
    }

    async fn fetch_and_store(&self, registry: &Registry, path: &Path) -> Result<RegistryContent> {
        let bytes = self.fetcher.fetch(&ContentLocation::of(registry)).await?;

        write_private(path, &bytes)
            .await
            .map_err(|source| RegistryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(registry_name = registry.name(), path = %path.display(), "Cached registry");

        RegistryContent::from_yaml_slice(&bytes).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn unsupported(registry: &Registry) -> RegistryError {
    RegistryError::UnsupportedRegistryType {
        name: registry.name().to_string(),
        registry_type: registry.registry_type().to_string(),
    }
}

async fn load(path: &Path) -> Result<RegistryContent> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    RegistryContent::from_yaml_slice(&bytes).map_err(|source| RegistryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `bytes` to `path`, readable by the owner only on Unix.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    const CATALOG: &str = "packages:\n- type: github_release\n  repo_owner: cli\n  repo_name: cli\n  asset: gh.tar.gz\n";

    struct CountingFetcher {
        body: &'static str,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ContentFetcher for CountingFetcher {
        async fn fetch(&self, _location: &ContentLocation) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_miss_fetches_and_persists() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = CountingFetcher::new(CATALOG);
        let acquirer = ContentAcquirer::new(root.path(), fetcher.clone());
        let registry = Registry::standard("v4.0.0");
        let config = root.path().join("tackle.yaml");

        let content = acquirer.acquire(&registry, &config).await.unwrap();

        assert_eq!(content.len(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        let cached = registry.cache_path(root.path(), &config).unwrap();
        assert_eq!(std::fs::read_to_string(cached).unwrap(), CATALOG);
    }

    #[tokio::test]
    async fn test_hit_never_fetches() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = CountingFetcher::new("packages: []\n");
        let acquirer = ContentAcquirer::new(root.path(), fetcher.clone());
        let registry = Registry::standard("v4.0.0");
        let config = root.path().join("tackle.yaml");

        let cached = registry.cache_path(root.path(), &config).unwrap();
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, CATALOG).unwrap();

        let content = acquirer.acquire(&registry, &config).await.unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_round_trip_through_cache() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = CountingFetcher::new(CATALOG);
        let acquirer = ContentAcquirer::new(root.path(), fetcher.clone());
        let registry = Registry::standard("v4.0.0");
        let config = root.path().join("tackle.yaml");

        let fetched = acquirer.acquire(&registry, &config).await.unwrap();
        let reloaded = acquirer.acquire(&registry, &config).await.unwrap();

        assert_eq!(fetched, reloaded);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_not_refetched() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = CountingFetcher::new(CATALOG);
        let acquirer = ContentAcquirer::new(root.path(), fetcher.clone());
        let registry = Registry::standard("v4.0.0");
        let config = root.path().join("tackle.yaml");

        let cached = registry.cache_path(root.path(), &config).unwrap();
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, "packages: [").unwrap();

        let err = acquirer.acquire(&registry, &config).await.unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("registry.yaml"), CATALOG).unwrap();
        let fetcher = CountingFetcher::new(CATALOG);
        let acquirer = ContentAcquirer::new(dir.path().join("root"), fetcher.clone());

        let content = acquirer
            .acquire(
                &Registry::local("corp", "registry.yaml"),
                &dir.path().join("tackle.yaml"),
            )
            .await
            .unwrap();

        assert_eq!(content.len(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_missing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = CountingFetcher::new(CATALOG);
        let acquirer = ContentAcquirer::new(dir.path(), fetcher.clone());

        let err = acquirer
            .acquire(
                &Registry::local("corp", "missing.yaml"),
                &dir.path().join("tackle.yaml"),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::LocalRegistryNotFound { ref name, .. } if name == "corp"
        ));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_type_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let acquirer = ContentAcquirer::new(dir.path(), CountingFetcher::new(CATALOG));
        let registry = Registry::normalize(tackle_core::RawRegistry {
            name: "weird".to_string(),
            registry_type: "svn".to_string(),
            path: "x.yaml".to_string(),
            ..Default::default()
        });

        let err = acquirer
            .acquire(&registry, &dir.path().join("tackle.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedRegistryType { .. }));
    }

    #[tokio::test]
    async fn test_setup_failure_is_terminal() {
        let root = tempfile::tempdir().unwrap();
        // a regular file where the cache tree should start
        std::fs::write(root.path().join("registries"), "").unwrap();

        let fetcher = CountingFetcher::new(CATALOG);
        let acquirer = ContentAcquirer::new(root.path(), fetcher.clone());
        let err = acquirer
            .acquire(&Registry::standard("v4.0.0"), &root.path().join("tackle.yaml"))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Io { .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_store_failure_after_fetch_is_terminal() {
        let root = tempfile::tempdir().unwrap();
        let registry = Registry::standard("v4.0.0");
        let config = root.path().join("tackle.yaml");

        let cached = registry.cache_path(root.path(), &config).unwrap();
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(root.path().join("gone/registry.yaml"), &cached).unwrap();

        let fetcher = CountingFetcher::new(CATALOG);
        let acquirer = ContentAcquirer::new(root.path(), fetcher.clone());
        let err = acquirer.acquire(&registry, &config).await.unwrap_err();

        assert!(matches!(err, RegistryError::Io { ref path, .. } if *path == cached));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
