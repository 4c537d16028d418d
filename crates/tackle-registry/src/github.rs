//! GitHub REST API client.
//!
//! Only the two operations tackle needs are implemented: reading a file
//! through the repository content API and looking up the latest release.

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{RegistryError, Result};
use crate::http::build_http_client;

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Repository operations used by the fetcher and by `init`.
#[async_trait]
pub trait RepositoryService: Send + Sync {
    /// Reads `path` at `git_ref` through the repository content API.
    async fn get_contents(
        &self,
        repo_owner: &str,
        repo_name: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<RepositoryContent>;

    /// Returns the latest published release.
    async fn get_latest_release(&self, repo_owner: &str, repo_name: &str) -> Result<Release>;
}

/// A release as returned by the releases API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Tag the release points at.
    pub tag_name: String,
}

/// One entry returned by the content API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentEntry {
    /// `file`, `dir`, `symlink` or `submodule`.
    #[serde(rename = "type")]
    pub entry_type: String,

    /// Entry name.
    pub name: String,

    /// Path inside the repository.
    pub path: String,

    /// Content encoding, `base64` for files.
    #[serde(default)]
    pub encoding: Option<String>,

    /// Encoded content. Only present on single-file responses.
    #[serde(default)]
    pub content: Option<String>,
}

impl ContentEntry {
    /// Decodes the content of a file entry.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported encoding or malformed base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let content = self.content.as_deref().unwrap_or_default();
        match self.encoding.as_deref() {
            Some("base64") => {
                // the API wraps base64 at 60 columns
                let compact: String = content.split_whitespace().collect();
                base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| RegistryError::ContentDecode {
                        path: self.path.clone(),
                        message: e.to_string(),
                    })
            }
            None | Some("") => Ok(content.as_bytes().to_vec()),
            Some(other) => Err(RegistryError::ContentDecode {
                path: self.path.clone(),
                message: format!("unsupported content encoding: {other}"),
            }),
        }
    }
}

/// Response of the content API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryContent {
    /// A single regular file.
    File(ContentEntry),
    /// A directory listing.
    Directory(Vec<ContentEntry>),
    /// A symlink or submodule.
    Other(ContentEntry),
}

impl RepositoryContent {
    /// Returns the file entry, if this is a regular file.
    #[must_use]
    pub const fn as_file(&self) -> Option<&ContentEntry> {
        match self {
            Self::File(entry) => Some(entry),
            Self::Directory(_) | Self::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentEntry>),
    Entry(ContentEntry),
}

impl From<ContentsResponse> for RepositoryContent {
    fn from(response: ContentsResponse) -> Self {
        match response {
            ContentsResponse::Listing(entries) => Self::Directory(entries),
            ContentsResponse::Entry(entry) if entry.entry_type == "file" => Self::File(entry),
            ContentsResponse::Entry(entry) => Self::Other(entry),
        }
    }
}

/// [`RepositoryService`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    token: Option<String>,
}

impl GitHubClient {
    /// Creates a client for the API endpoint and token of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_url = Url::parse(&config.github_api_url).map_err(|_| RegistryError::InvalidUrl {
            url: config.github_api_url.clone(),
        })?;

        Ok(Self {
            http: build_http_client(config)?,
            api_url,
            token: config.github_token.clone(),
        })
    }

    /// Returns true if requests are authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Builds `<api>/repos/<owner>/<repo>/<rest...>`.
    fn repo_url<'a>(
        &self,
        repo_owner: &str,
        repo_name: &str,
        rest: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::InvalidUrl {
                url: self.api_url.to_string(),
            })?
            .pop_if_empty()
            .extend(["repos", repo_owner, repo_name])
            .extend(rest);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    RegistryError::InvalidConfig {
                        message: "Invalid GitHub token".to_string(),
                    }
                })?,
            );
        }
        Ok(headers)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.http.get(url.clone()).headers(self.headers()?).send().await?;

        if !response.status().is_success() {
            return Err(RegistryError::HttpError {
                status: response.status().as_u16(),
                message: format!("GET {url}: {}", response.text().await.unwrap_or_default()),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(Into::into)
    }
}

#[async_trait]
impl RepositoryService for GitHubClient {
    async fn get_contents(
        &self,
        repo_owner: &str,
        repo_name: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<RepositoryContent> {
        let segments = std::iter::once("contents").chain(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.repo_url(repo_owner, repo_name, segments)?;
        url.query_pairs_mut().append_pair("ref", git_ref);

        tracing::debug!(repo_owner, repo_name, path, git_ref, "Reading content via GitHub API");
        let response: ContentsResponse = self.get_json(url).await?;
        Ok(response.into())
    }

    async fn get_latest_release(&self, repo_owner: &str, repo_name: &str) -> Result<Release> {
        let url = self.repo_url(repo_owner, repo_name, ["releases", "latest"])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubClient {
        GitHubClient::new(&ClientConfig::new("/cache").with_github_token("ghp_test")).unwrap()
    }

    #[test]
    fn test_repo_url() {
        let url = client()
            .repo_url("aquaproj", "aqua-registry", ["contents", "pkgs", "registry.yaml"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/aquaproj/aqua-registry/contents/pkgs/registry.yaml"
        );
    }

    #[test]
    fn test_headers_with_token() {
        let headers = client().headers().unwrap();
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer ghp_test"
        );
    }

    #[test]
    fn test_headers_without_token() {
        let client = GitHubClient::new(&ClientConfig::new("/cache")).unwrap();
        assert!(!client.is_authenticated());
        assert!(!client.headers().unwrap().contains_key(AUTHORIZATION));
    }

    #[test]
    fn test_invalid_api_url() {
        let config = ClientConfig::new("/cache").with_github_api_url("not a url");
        assert!(matches!(
            GitHubClient::new(&config),
            Err(RegistryError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_parse_file_response() {
        let body = r#"{"type":"file","name":"registry.yaml","path":"registry.yaml","encoding":"base64","content":"cGFja2Fn\nZXM6IFtd\n"}"#;
        let content: RepositoryContent = serde_json::from_str::<ContentsResponse>(body)
            .unwrap()
            .into();

        let file = content.as_file().unwrap();
        assert_eq!(file.decode().unwrap(), b"packages: []");
    }

    #[test]
    fn test_parse_directory_response() {
        let body = r#"[{"type":"file","name":"a.yaml","path":"pkgs/a.yaml"},{"type":"dir","name":"b","path":"pkgs/b"}]"#;
        let content: RepositoryContent = serde_json::from_str::<ContentsResponse>(body)
            .unwrap()
            .into();

        assert!(matches!(content, RepositoryContent::Directory(ref entries) if entries.len() == 2));
        assert!(content.as_file().is_none());
    }

    #[test]
    fn test_parse_symlink_response() {
        let body = r#"{"type":"symlink","name":"link","path":"link","target":"registry.yaml"}"#;
        let content: RepositoryContent = serde_json::from_str::<ContentsResponse>(body)
            .unwrap()
            .into();
        assert!(matches!(content, RepositoryContent::Other(_)));
    }

    #[test]
    fn test_decode_unsupported_encoding() {
        let entry = ContentEntry {
            entry_type: "file".to_string(),
            name: "big.yaml".to_string(),
            path: "big.yaml".to_string(),
            encoding: Some("none".to_string()),
            content: Some(String::new()),
        };
        assert!(matches!(
            entry.decode(),
            Err(RegistryError::ContentDecode { .. })
        ));
    }

    #[test]
    fn test_decode_plain_content() {
        let entry = ContentEntry {
            entry_type: "file".to_string(),
            name: "r.yaml".to_string(),
            path: "r.yaml".to_string(),
            encoding: None,
            content: Some("packages: []".to_string()),
        };
        assert_eq!(entry.decode().unwrap(), b"packages: []");
    }
}
