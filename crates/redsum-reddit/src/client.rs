use async_trait::async_trait;
use redsum_types::{FetchError, ThreadContent};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::listing::parse_thread;
use crate::locator::ThreadLocator;
use crate::ThreadFetcher;

pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";

fn default_base_url() -> String {
    REDDIT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("redsum/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Reddit throttles generic user agents aggressively.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RedditConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Fetches threads from Reddit's public JSON endpoints.
pub struct RedditClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FetchError::Network(format!("invalid user agent: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
        })
    }

    pub async fn fetch_locator(&self, locator: &ThreadLocator) -> Result<ThreadContent, FetchError> {
        let json_url = locator.json_url(&self.base_url);
        tracing::info!(url = %json_url, "Fetching Reddit thread");

        let response = self
            .http_client
            .get(&json_url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(json_url));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        let thread = parse_thread(&body)?;

        tracing::info!(
            subreddit = %thread.subreddit,
            comments = thread.comment_bodies.len(),
            "Fetched Reddit thread"
        );

        Ok(thread)
    }
}

fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else if e.is_decode() {
        FetchError::Malformed(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[async_trait]
impl ThreadFetcher for RedditClient {
    async fn fetch(&self, url: &str) -> Result<ThreadContent, FetchError> {
        let locator = ThreadLocator::parse(url)?;
        self.fetch_locator(&locator).await
    }
}
