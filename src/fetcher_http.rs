//! HTTP-based page fetcher using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{redirect, Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::fetcher::PageFetcher;
use crate::proxy::ProxyConfig;
use crate::{CrawlerError, Result};

/// Upper bound on the upstream body kept in an error, in characters.
const ERROR_BODY_LIMIT: usize = 1024;

/// Bytes read from an error body before giving up on the rest. Four bytes
/// cover the widest UTF-8 character.
const ERROR_BODY_READ_LIMIT: usize = ERROR_BODY_LIMIT * 4;

/// A page fetcher that issues plain HTTP requests via reqwest.
///
/// Each call builds its own client routed through the requested proxy and
/// drops it before returning, so no connection outlives a single fetch.
/// Redirects are not followed: a `3xx` answer counts as a failed request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    user_agent: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl HttpFetcher {
    /// Creates a new `HttpFetcher` with default settings.
    pub fn new() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; github-crawler/0.1)".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the overall request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the overall request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_client(&self, proxy: &ProxyConfig) -> Result<Client> {
        Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .proxy(proxy.to_reqwest()?)
            .build()
            .map_err(|e| CrawlerError::Other(format!("Failed to create HTTP client: {}", e)))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, proxy: &ProxyConfig, headers: &HeaderMap) -> Result<String> {
        let client = self.build_client(proxy)?;
        debug!("GET {} via {}:{}", url, proxy.host, proxy.port);

        let response = client.get(url).headers(headers.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::OK {
            let body = response.text().await?;
            debug!("Fetched {} bytes from {}", body.len(), url);
            return Ok(body);
        }

        warn!("Upstream answered {} for {}", status, url);
        Err(CrawlerError::UpstreamRequestFailed {
            status: status.as_u16(),
            body: error_body_snippet(response).await,
        })
    }
}

/// Reads the leading part of an error body.
///
/// A read failure ends the snippet early instead of replacing the upstream
/// status with a transport error.
async fn error_body_snippet(mut response: Response) -> String {
    let mut bytes = Vec::new();
    while bytes.len() < ERROR_BODY_READ_LIMIT {
        match response.chunk().await {
            Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                debug!("Error body read stopped early: {}", e);
                break;
            }
        }
    }
    String::from_utf8_lossy(&bytes)
        .chars()
        .take(ERROR_BODY_LIMIT)
        .collect()
}
