//! Content API client: paginated post listing for one blog.

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;
use tracing::info;

const BLOG_API_BASE: &str = "https://www.googleapis.com/blogger/v3/";

#[derive(Clone)]
pub struct BlogClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for BlogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlogClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct PostListResponse {
    #[serde(default)]
    items: Vec<Post>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Post {
    url: String,
}

impl BlogClient {
    pub fn new(api_key: String) -> Self {
        let base_url = Url::parse(BLOG_API_BASE).expect("valid default content API URL");
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("indexping/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Fetch every published post URL for `blog_id`, following the API's
    /// continuation token until no further page remains. Any HTTP or decode
    /// error propagates; the run treats listing failures as fatal.
    pub async fn list_posts(&self, blog_id: &str) -> Result<Vec<String>> {
        let endpoint = self
            .base_url
            .join(&format!("blogs/{blog_id}/posts"))
            .context("invalid content API URL")?;

        let mut urls = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(endpoint.clone())
                .query(&[("key", self.api_key.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let res = request.send().await.context("failed to reach content API")?;
            if !res.status().is_success() {
                let status = res.status();
                let body = res.text().await.unwrap_or_default();
                return Err(anyhow!("content API error {status}: {body}"));
            }
            let page: PostListResponse = res
                .json()
                .await
                .context("invalid content API response JSON")?;

            urls.extend(page.items.into_iter().map(|post| post.url));
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        info!(blog_id, count = urls.len(), "listed blog posts");
        Ok(urls)
    }
}
