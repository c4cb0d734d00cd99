//! Error types for the crawler library.

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Errors that can occur while crawling.
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// No proxy was supplied to choose from.
    #[error("No proxies supplied for the crawl")]
    EmptyProxyList,

    /// A proxy entry could not be turned into a transport route.
    #[error("Invalid proxy '{0}'")]
    InvalidProxy(String),

    /// The search endpoint answered with something other than 200.
    #[error("Request failed with status {status}.\nDetail: {body}")]
    UpstreamRequestFailed {
        /// Upstream HTTP status code.
        status: u16,
        /// Leading part of the upstream response body.
        body: String,
    },

    /// The returned markup could not be processed.
    #[error("HTML response processing failed: {0}")]
    ParsingFailed(String),

    /// The crawl did not finish within the configured time.
    #[error("Crawl timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// HTTP transport failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl CrawlerError {
    /// Returns whether the error comes from the caller's input rather than
    /// the upstream site or the transport.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyProxyList | Self::InvalidProxy(_))
    }
}
