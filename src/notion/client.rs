//! Notion page client.
//!
//! [`RemoteDocumentClient`] is the seam between the update pipeline and the
//! Notion API: the pipeline only reads and patches page properties.
//! [`NotionClient`] implements it over HTTPS; tests use an in-memory fake.

use std::future::Future;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use super::error::NotionApiError;
use super::property::{PageSnapshot, PropertyPatch};
use crate::types::PageId;

/// Default `Notion-Version` header value.
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";

/// Read/patch access to Notion pages.
///
/// Implementations must be cheap to share; the pipeline holds one behind an
/// `Arc` and calls it from many concurrently running jobs.
pub trait RemoteDocumentClient: Send + Sync + 'static {
    /// Fetches the current properties of a page.
    fn get(&self, page_id: &PageId)
    -> impl Future<Output = Result<PageSnapshot, NotionApiError>> + Send;

    /// Writes the given properties to a page, leaving others untouched.
    fn patch(
        &self,
        page_id: &PageId,
        properties: &PropertyPatch,
    ) -> impl Future<Output = Result<(), NotionApiError>> + Send;
}

/// Connection settings for [`NotionClient`].
#[derive(Clone)]
pub struct NotionConfig {
    pub api_token: String,
    pub notion_version: String,
    pub base_url: String,
}

impl NotionConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        NotionConfig {
            api_token: api_token.into(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl std::fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_token", &"<redacted>")
            .field("notion_version", &self.notion_version)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// A Notion REST client authenticated with an integration token.
#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
}

impl NotionClient {
    /// Builds a client with the integration token and version baked into its
    /// default headers.
    pub fn new(config: &NotionConfig) -> Result<Self, NotionApiError> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|_| NotionApiError::permanent("API token is not a valid header"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let version = HeaderValue::from_str(&config.notion_version).map_err(|_| {
            NotionApiError::permanent("Notion version is not a valid header")
        })?;
        headers.insert("Notion-Version", version);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(NotionApiError::from_reqwest)?;

        Ok(NotionClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, page_id: &PageId) -> Result<reqwest::Url, NotionApiError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| NotionApiError::permanent(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| NotionApiError::permanent("base URL cannot be a base"))?
            .pop_if_empty()
            .extend(["v1", "pages", page_id.as_str()]);
        Ok(url)
    }

    /// Sends a request and turns non-2xx responses into errors.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, NotionApiError> {
        let response = request.send().await.map_err(NotionApiError::from_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(NotionApiError::from_reqwest)?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(NotionApiError::from_status(status.as_u16(), body))
        }
    }
}

impl RemoteDocumentClient for NotionClient {
    async fn get(&self, page_id: &PageId) -> Result<PageSnapshot, NotionApiError> {
        let url = self.page_url(page_id)?;
        debug!(page_id = %page_id, "Fetching Notion page");

        let body = self.send(self.http.get(url)).await?;
        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            NotionApiError::permanent(format!("page response is not JSON: {e}"))
        })?;
        PageSnapshot::from_json(&value).map_err(|e| {
            NotionApiError::permanent(format!("page response has unexpected shape: {e}"))
        })
    }

    async fn patch(
        &self,
        page_id: &PageId,
        properties: &PropertyPatch,
    ) -> Result<(), NotionApiError> {
        let url = self.page_url(page_id)?;
        debug!(page_id = %page_id, properties = properties.len(), "Patching Notion page");

        let body = properties.to_request_body().to_string();
        self.send(self.http.patch(url).body(body)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
