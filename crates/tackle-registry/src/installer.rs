//! Resolving every configured registry at once.
//!
//! One task is spawned per registry and a semaphore bounds how many run at
//! the same time. A failing task never cancels the others: every task runs to
//! completion, then the run fails as a whole if any of them failed. Per
//! registry causes are only reported through logs.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tackle_core::{Registry, RegistryContent, Validate};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::acquirer::ContentAcquirer;
use crate::config::ClientConfig;
use crate::error::{RegistryError, Result};
use crate::fetcher::RemoteContentFetcher;

/// Key under which an inline catalog is returned.
pub const INLINE_REGISTRY_NAME: &str = "inline";

/// Resolved catalogs keyed by registry name.
pub type RegistryContents = BTreeMap<String, RegistryContent>;

/// Resolves many registries with bounded parallelism.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tackle_core::Registry;
/// use tackle_registry::{ClientConfig, RegistryInstaller};
///
/// # async fn run() -> Result<(), tackle_registry::RegistryError> {
/// let installer = RegistryInstaller::from_config(&ClientConfig::default())?;
/// let contents = installer
///     .install(&[Registry::standard("v4.0.0")], None, Path::new("tackle.yaml"))
///     .await?;
/// println!("{} packages", contents["standard"].len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RegistryInstaller {
    acquirer: Arc<ContentAcquirer>,
    max_parallelism: usize,
}

impl RegistryInstaller {
    /// Creates an installer running at most `max_parallelism` acquisitions at
    /// a time. The cap is clamped to `1..=Semaphore::MAX_PERMITS`.
    #[must_use]
    pub fn new(acquirer: Arc<ContentAcquirer>, max_parallelism: usize) -> Self {
        Self {
            acquirer,
            max_parallelism: max_parallelism.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    /// Creates an installer with the remote fetcher described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetcher cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let fetcher = Arc::new(RemoteContentFetcher::from_config(config)?);
        let acquirer = Arc::new(ContentAcquirer::new(config.root_dir.clone(), fetcher));
        Ok(Self::new(acquirer, config.max_parallelism))
    }

    /// The parallelism cap.
    #[must_use]
    pub const fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    /// Resolves `registries`, declared in `config_file_path`, and returns
    /// their catalogs keyed by name. `inline`, if given, is returned under
    /// [`INLINE_REGISTRY_NAME`] without any I/O.
    ///
    /// Registries sharing a name overwrite each other; the survivor is
    /// whichever finished last.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InstallFailure`] once every task has finished
    /// if any registry failed, or [`RegistryError::InvalidContent`] for the
    /// first catalog, in name order, that fails validation.
    pub async fn install(
        &self,
        registries: &[Registry],
        inline: Option<RegistryContent>,
        config_file_path: &Path,
    ) -> Result<RegistryContents> {
        let contents = Arc::new(Mutex::new(RegistryContents::new()));
        let failed = Arc::new(AtomicUsize::new(0));

        if let Some(inline) = inline {
            contents.lock().insert(INLINE_REGISTRY_NAME.to_string(), inline);
        }

        let permits = Arc::new(Semaphore::new(self.max_parallelism));
        let config_file_path: Arc<Path> = Arc::from(config_file_path);
        let mut tasks = JoinSet::new();
        let mut task_names = HashMap::with_capacity(registries.len());

        for registry in registries.iter().cloned() {
            let permits = Arc::clone(&permits);
            let acquirer = Arc::clone(&self.acquirer);
            let contents = Arc::clone(&contents);
            let failed = Arc::clone(&failed);
            let config_file_path = Arc::clone(&config_file_path);

            let registry_name = registry.name().to_string();
            let handle = tasks.spawn(async move {
                // the semaphore is never closed
                let Ok(_permit) = permits.acquire_owned().await else {
                    failed.fetch_add(1, Ordering::SeqCst);
                    return;
                };

                match acquirer.acquire(&registry, &config_file_path).await {
                    Ok(content) => {
                        let previous = contents.lock().insert(registry.name().to_string(), content);
                        if previous.is_some() {
                            tracing::warn!(
                                registry_name = registry.name(),
                                "Registry name is used more than once, keeping the last one"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            registry_name = registry.name(),
                            error = %e,
                            "Failed to install the registry"
                        );
                        failed.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
            task_names.insert(handle.id(), registry_name);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                let registry_name = task_names.get(&e.id()).map_or("", String::as_str);
                tracing::error!(registry_name, error = %e, "Registry installation task panicked");
                failed.fetch_add(1, Ordering::SeqCst);
            }
        }

        let failed = failed.load(Ordering::SeqCst);
        if failed > 0 {
            return Err(RegistryError::InstallFailure {
                failed,
                total: registries.len(),
            });
        }

        let contents = std::mem::take(&mut *contents.lock());
        for (name, content) in &contents {
            content
                .validate()
                .map_err(|source| RegistryError::InvalidContent {
                    registry_name: name.clone(),
                    source,
                })?;
        }

        tracing::info!(
            registries = contents.len(),
            root_dir = %self.acquirer.root_dir().display(),
            "Installed registries"
        );
        Ok(contents)
    }
}
