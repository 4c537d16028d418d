//! Remote catalog fetching.
//!
//! A GitHub-hosted catalog is first downloaded from the raw content endpoint,
//! which needs no credentials. Only when that fails is the authenticated
//! content API tried, and only if a token was configured. Each tier is tried
//! once.

use std::sync::Arc;

use async_trait::async_trait;
use tackle_core::Registry;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{RegistryError, Result};
use crate::github::{GitHubClient, RepositoryService};
use crate::http::{HttpDownloader, RawDownloader};

/// A file inside a GitHub repository at a given ref.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentLocation {
    /// Repository owner.
    pub repo_owner: String,
    /// Repository name.
    pub repo_name: String,
    /// Git ref.
    pub git_ref: String,
    /// Path inside the repository.
    pub path: String,
}

impl ContentLocation {
    /// Creates a location.
    pub fn new(
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
        git_ref: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            git_ref: git_ref.into(),
            path: path.into(),
        }
    }

    /// Location of a `github_content` registry's catalog.
    #[must_use]
    pub fn of(registry: &Registry) -> Self {
        Self::new(
            registry.repo_owner(),
            registry.repo_name(),
            registry.git_ref(),
            registry.path(),
        )
    }

    /// Builds `<base>/<owner>/<repo>/<ref>/<path>`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` cannot carry path segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use tackle_registry::ContentLocation;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://raw.githubusercontent.com").unwrap();
    /// let location = ContentLocation::new("aquaproj", "aqua-registry", "v4.0.0", "registry.yaml");
    /// assert_eq!(
    ///     location.raw_url(&base).unwrap().as_str(),
    ///     "https://raw.githubusercontent.com/aquaproj/aqua-registry/v4.0.0/registry.yaml"
    /// );
    /// ```
    pub fn raw_url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::InvalidUrl {
                url: base.to_string(),
            })?
            .pop_if_empty()
            .extend([self.repo_owner.as_str(), self.repo_name.as_str()])
            .extend(self.git_ref.split('/'))
            .extend(self.path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

/// Produces the raw bytes of a remote catalog.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetches the file at `location`.
    async fn fetch(&self, location: &ContentLocation) -> Result<Vec<u8>>;
}

/// Two-tier [`ContentFetcher`]: raw download, then the GitHub content API.
#[derive(Clone)]
pub struct RemoteContentFetcher {
    downloader: Arc<dyn RawDownloader>,
    github: Option<Arc<dyn RepositoryService>>,
    raw_content_url: Url,
}

impl std::fmt::Debug for RemoteContentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteContentFetcher")
            .field("raw_content_url", &self.raw_content_url.as_str())
            .field("github", &self.github.is_some())
            .finish_non_exhaustive()
    }
}

impl RemoteContentFetcher {
    /// Creates a fetcher from its collaborators.
    ///
    /// Passing `None` for `github` disables the content API fallback.
    #[must_use]
    pub fn new(
        downloader: Arc<dyn RawDownloader>,
        github: Option<Arc<dyn RepositoryService>>,
        raw_content_url: Url,
    ) -> Self {
        Self {
            downloader,
            github,
            raw_content_url,
        }
    }

    /// Creates a fetcher from `config`. The content API is only used when a
    /// GitHub token is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid or an HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let raw_content_url =
            Url::parse(&config.raw_content_url).map_err(|_| RegistryError::InvalidUrl {
                url: config.raw_content_url.clone(),
            })?;
        let downloader: Arc<dyn RawDownloader> = Arc::new(HttpDownloader::new(config)?);
        let client = GitHubClient::new(config)?;
        let github: Option<Arc<dyn RepositoryService>> = if client.is_authenticated() {
            Some(Arc::new(client))
        } else {
            None
        };

        Ok(Self::new(downloader, github, raw_content_url))
    }

    async fn download_raw(&self, location: &ContentLocation) -> Result<Vec<u8>> {
        let url = location.raw_url(&self.raw_content_url)?;
        self.downloader.download(&url).await
    }
}

#[async_trait]
impl ContentFetcher for RemoteContentFetcher {
    async fn fetch(&self, location: &ContentLocation) -> Result<Vec<u8>> {
        match self.download_raw(location).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                tracing::debug!(
                    repo_owner = %location.repo_owner,
                    repo_name = %location.repo_name,
                    git_ref = %location.git_ref,
                    path = %location.path,
                    error = %e,
                    "Failed to download content without the GitHub API, trying the GitHub API"
                );
            }
        }

        let Some(github) = &self.github else {
            return Err(RegistryError::GitHubTokenRequired);
        };

        let content = github
            .get_contents(
                &location.repo_owner,
                &location.repo_name,
                &location.path,
                &location.git_ref,
            )
            .await?;

        match content.as_file() {
            Some(entry) => entry.decode(),
            None => Err(RegistryError::ContentMustBeFile {
                repo_owner: location.repo_owner.clone(),
                repo_name: location.repo_name.clone(),
                path: location.path.clone(),
                git_ref: location.git_ref.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::github::{ContentEntry, Release, RepositoryContent};

    struct StubDownloader {
        body: Option<Vec<u8>>,
        calls: AtomicUsize,
    }

    impl StubDownloader {
        fn new(body: Option<&[u8]>) -> Arc<Self> {
            Arc::new(Self {
                body: body.map(<[u8]>::to_vec),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RawDownloader for StubDownloader {
        async fn download(&self, _url: &Url) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.clone().ok_or_else(|| RegistryError::HttpError {
                status: 404,
                message: "not found".to_string(),
            })
        }
    }

    struct StubRepositoryService {
        content: RepositoryContent,
        calls: AtomicUsize,
    }

    impl StubRepositoryService {
        fn new(content: RepositoryContent) -> Arc<Self> {
            Arc::new(Self {
                content,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RepositoryService for StubRepositoryService {
        async fn get_contents(
            &self,
            _repo_owner: &str,
            _repo_name: &str,
            _path: &str,
            _git_ref: &str,
        ) -> Result<RepositoryContent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.content.clone())
        }

        async fn get_latest_release(&self, _: &str, _: &str) -> Result<Release> {
            Ok(Release {
                tag_name: "v4.0.0".to_string(),
            })
        }
    }

    fn file_entry(content: &str) -> ContentEntry {
        ContentEntry {
            entry_type: "file".to_string(),
            name: "registry.yaml".to_string(),
            path: "registry.yaml".to_string(),
            encoding: None,
            content: Some(content.to_string()),
        }
    }

    fn location() -> ContentLocation {
        ContentLocation::new("aquaproj", "aqua-registry", "v4.0.0", "registry.yaml")
    }

    fn raw_base() -> Url {
        Url::parse("https://raw.example.com").unwrap()
    }

    #[tokio::test]
    async fn test_primary_success_skips_api() {
        let downloader = StubDownloader::new(Some(b"packages: []"));
        let github = StubRepositoryService::new(RepositoryContent::File(file_entry("unused")));
        let fetcher = RemoteContentFetcher::new(
            downloader.clone(),
            Some(github.clone() as Arc<dyn RepositoryService>),
            raw_base(),
        );

        assert_eq!(fetcher.fetch(&location()).await.unwrap(), b"packages: []");
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(github.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_without_token() {
        let downloader = StubDownloader::new(None);
        let fetcher = RemoteContentFetcher::new(downloader.clone(), None, raw_base());

        let err = fetcher.fetch(&location()).await.unwrap_err();
        assert!(matches!(err, RegistryError::GitHubTokenRequired));
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_to_api() {
        let downloader = StubDownloader::new(None);
        let github =
            StubRepositoryService::new(RepositoryContent::File(file_entry("packages: []")));
        let fetcher = RemoteContentFetcher::new(
            downloader,
            Some(github.clone() as Arc<dyn RepositoryService>),
            raw_base(),
        );

        assert_eq!(fetcher.fetch(&location()).await.unwrap(), b"packages: []");
        assert_eq!(github.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_directory_is_rejected() {
        let github = StubRepositoryService::new(RepositoryContent::Directory(vec![file_entry("")]));
        let fetcher = RemoteContentFetcher::new(
            StubDownloader::new(None),
            Some(github as Arc<dyn RepositoryService>),
            raw_base(),
        );

        let err = fetcher.fetch(&location()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ContentMustBeFile { ref path, .. } if path == "registry.yaml"
        ));
    }

    #[test]
    fn test_raw_url_nested_path() {
        let location = ContentLocation::new("corp", "catalog", "main", "pkgs/tools/registry.yaml");
        assert_eq!(
            location.raw_url(&raw_base()).unwrap().as_str(),
            "https://raw.example.com/corp/catalog/main/pkgs/tools/registry.yaml"
        );
    }

    #[test]
    fn test_location_of_registry() {
        let registry = Registry::standard("v4.0.0");
        assert_eq!(ContentLocation::of(&registry), location());
    }

    #[test]
    fn test_from_config_without_token_has_no_api() {
        let fetcher = RemoteContentFetcher::from_config(&ClientConfig::new("/cache")).unwrap();
        assert!(fetcher.github.is_none());

        let fetcher =
            RemoteContentFetcher::from_config(&ClientConfig::new("/cache").with_github_token("t"))
                .unwrap();
        assert!(fetcher.github.is_some());
    }
}
