//! Plain HTTP downloads.

use async_trait::async_trait;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{RegistryError, Result};

/// Downloads the body of a URL.
#[async_trait]
pub trait RawDownloader: Send + Sync {
    /// Fetches `url` and returns its body. Any non-success status is an error.
    async fn download(&self, url: &Url) -> Result<Vec<u8>>;
}

/// [`RawDownloader`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    http: reqwest::Client,
}

impl HttpDownloader {
    /// Creates a downloader using the timeout and user agent of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl RawDownloader for HttpDownloader {
    async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.http.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(RegistryError::HttpError {
                status: response.status().as_u16(),
                message: format!("GET {url}"),
            });
        }

        response.bytes().await.map(|b| b.to_vec()).map_err(Into::into)
    }
}

/// Builds an HTTP client with the configured timeout and user agent.
pub(crate) fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| RegistryError::InvalidConfig {
            message: format!("Failed to build HTTP client: {e}"),
        })
}
