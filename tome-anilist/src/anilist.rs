//! AniList client implementation.
//!
//! Every lookup is a single GraphQL POST. Failures map onto the remote half
//! of [`TomeError`]: unreachable service → `Transport`, non-2xx →
//! `UnexpectedStatus`, unexpected body → `Decode`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use tome_core::constants::{ANILIST_GRAPHQL_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_SEARCH_PAGE_SIZE};
use tome_core::error::{Result, TomeError};
use tome_core::traits::RemoteLookup;
use tome_core::types::Manga;

use crate::query::{SEARCH_BY_ID, SEARCH_BY_NAME};

/// AniList client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnilistConfig {
    /// GraphQL endpoint
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Results requested per search
    pub per_page: u32,
}

impl Default for AnilistConfig {
    fn default() -> Self {
        Self {
            endpoint: ANILIST_GRAPHQL_URL.into(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
            per_page: DEFAULT_SEARCH_PAGE_SIZE,
        }
    }
}

impl AnilistConfig {
    /// Creates a config pointing at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets how many results a search asks for.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Parses and checks the endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| TomeError::Config(format!("Invalid AniList endpoint '{}': {}", self.endpoint, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(TomeError::Config(format!(
                "AniList endpoint must be http or https, got '{}'",
                other
            ))),
        }
    }
}

/// AniList GraphQL client.
pub struct AnilistClient {
    endpoint: Url,
    per_page: u32,
    http_client: reqwest::Client,
}

impl AnilistClient {
    /// Creates a client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(AnilistConfig::default())
    }

    /// Creates a client with custom configuration.
    pub fn with_config(config: AnilistConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;

        if config.per_page == 0 {
            return Err(TomeError::Config("per_page must be at least 1".into()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("tome/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TomeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            per_page: config.per_page,
            http_client,
        })
    }

    /// Returns the endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends one GraphQL request and decodes its `data` member.
    async fn post<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TomeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "AniList returned non-success status");
            return Err(TomeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TomeError::Transport(e.to_string()))?;

        let envelope: GraphQlResponse<T> =
            serde_json::from_slice(&bytes).map_err(|e| TomeError::Decode(e.to_string()))?;

        match envelope.data {
            Some(data) => Ok(data),
            None => {
                let messages: Vec<&str> = envelope.errors.iter().map(|e| e.message.as_str()).collect();
                Err(TomeError::Decode(if messages.is_empty() {
                    "response carried no data".into()
                } else {
                    format!("response carried no data: {}", messages.join("; "))
                }))
            }
        }
    }
}

#[async_trait]
impl RemoteLookup for AnilistClient {
    #[instrument(skip(self))]
    async fn fetch_by_id(&self, id: i64) -> Result<Manga> {
        debug!("Sending id request to AniList");

        let data: ByIdData = self
            .post(SEARCH_BY_ID, serde_json::json!({ "id": id }))
            .await?;

        let manga = data
            .media
            .ok_or_else(|| TomeError::Decode(format!("no media in response for id {}", id)))?;

        info!(id = manga.id, title = manga.display_title(), "Got manga from AniList");
        Ok(manga)
    }

    #[instrument(skip(self))]
    async fn fetch_by_name(&self, query: &str) -> Result<Vec<Manga>> {
        debug!("Sending search request to AniList");

        let data: ByNameData = self
            .post(
                SEARCH_BY_NAME,
                serde_json::json!({
                    "query": query,
                    "page": 1,
                    "perPage": self.per_page,
                }),
            )
            .await?;

        let mangas = data.page.media;
        info!(results = mangas.len(), "Got search results from AniList");
        Ok(mangas)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ByIdData {
    #[serde(rename = "Media", alias = "media")]
    media: Option<Manga>,
}

#[derive(Debug, Deserialize)]
struct ByNameData {
    #[serde(rename = "Page", alias = "page")]
    page: PageData,
}

#[derive(Debug, Deserialize)]
struct PageData {
    #[serde(default)]
    media: Vec<Manga>,
}
