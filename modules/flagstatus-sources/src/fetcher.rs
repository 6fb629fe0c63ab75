use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Result, SourceError};

/// Some government sites reject default client identifiers.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

// ---------------------------------------------------------------------------
// Fetcher: every outbound request from an adapter goes through this
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body as text. Non-2xx is an error.
    async fn get(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    async fn get(&self, url: &str) -> Result<String> {
        (**self).get(url).await
    }
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| SourceError::Network {
                url: String::new(),
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        info!(timeout_secs = timeout.as_secs(), "HttpFetcher initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String> {
        debug!(url, "GET");

        let resp = self
            .client
            .get(url)
            .header("Accept", ACCEPT)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::http(url, status.as_u16(), &body));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;

        debug!(url, status = status.as_u16(), bytes = body.len(), "fetched");
        Ok(body)
    }
}
