//! Indexing API session: one authenticated client per run, shared across the
//! whole batch.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Url};
use serde_json::json;
use std::fmt;

const INDEXING_API_BASE: &str = "https://indexing.googleapis.com/";
const PUBLISH_PATH: &str = "v3/urlNotifications:publish";

pub struct IndexingSession {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for IndexingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexingSession")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl IndexingSession {
    /// Establish the run's authenticated session. The credential is attached
    /// to every request; token acquisition itself is delegated to whatever
    /// issued `api_key`.
    pub fn new(api_key: &str) -> Result<Self> {
        let base_url = Url::parse(INDEXING_API_BASE).expect("valid default indexing API URL");
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: &str, base_url: Url) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("API key is not a valid header value")?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        let http = Client::builder()
            .user_agent("indexping/0.1")
            .default_headers(headers)
            .build()
            .context("failed to build indexing HTTP client")?;
        Ok(Self { http, base_url })
    }

    /// Post one `URL_UPDATED` event. Returns the raw HTTP status and body;
    /// the caller decides what counts as success (exactly 200).
    pub async fn publish_update(&self, url: &str) -> Result<(u16, String)> {
        let endpoint = self
            .base_url
            .join(PUBLISH_PATH)
            .context("invalid indexing API URL")?;
        let payload = json!({ "url": url, "type": "URL_UPDATED" });
        let res = self
            .http
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .context("failed to reach indexing API")?;
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Ok((status, body))
    }
}
