//! Configuration for registry resolution.

use std::path::PathBuf;
use std::time::Duration;

/// Base URL of the unauthenticated raw content endpoint.
pub const DEFAULT_RAW_CONTENT_URL: &str = "https://raw.githubusercontent.com";

/// Base URL of the GitHub REST API.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Settings shared by the fetcher, the acquirer and the installer.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root directory of the on-disk registry cache.
    pub root_dir: PathBuf,

    /// Maximum number of registries resolved at the same time.
    pub max_parallelism: usize,

    /// Request timeout applied by the HTTP client.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// GitHub access token. Without it the content API fallback is disabled.
    pub github_token: Option<String>,

    /// Raw content endpoint base URL.
    pub raw_content_url: String,

    /// GitHub REST API base URL.
    pub github_api_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            max_parallelism: default_max_parallelism(),
            timeout: Duration::from_secs(30),
            user_agent: format!("tackle/{}", env!("CARGO_PKG_VERSION")),
            github_token: None,
            raw_content_url: DEFAULT_RAW_CONTENT_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration rooted at `root_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tackle_registry::ClientConfig;
    ///
    /// let config = ClientConfig::new("/tmp/tackle").with_max_parallelism(4);
    /// assert_eq!(config.max_parallelism, 4);
    /// assert!(config.github_token.is_none());
    /// ```
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// Sets the parallelism cap. Zero is raised to one.
    #[must_use]
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism.max(1);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the GitHub access token. Empty tokens are ignored.
    #[must_use]
    pub fn with_github_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.github_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Overrides the raw content endpoint.
    #[must_use]
    pub fn with_raw_content_url(mut self, url: impl Into<String>) -> Self {
        self.raw_content_url = url.into();
        self
    }

    /// Overrides the GitHub API endpoint.
    #[must_use]
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }
}

/// Default cache root (`<data dir>/tackle`).
fn default_root_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tackle")
}

/// Host parallelism, or one when it cannot be determined.
fn default_max_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
