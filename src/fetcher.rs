//! Page fetcher abstraction for retrieving search-result markup.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

use crate::proxy::ProxyConfig;
use crate::Result;

/// Header set sent with every search request.
///
/// Only HTML is acceptable; the search endpoint answers JSON for other
/// `Accept` values.
pub fn search_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
    headers
}

/// Trait for fetching the HTML content of a URL through a proxy.
///
/// Timeouts and the user agent are set at construction time. A call either
/// yields the body of a `200 OK` response or an error; any other status is
/// reported as [`CrawlerError::UpstreamRequestFailed`](crate::CrawlerError).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` through `proxy`, sending `headers`.
    async fn fetch(&self, url: &str, proxy: &ProxyConfig, headers: &HeaderMap) -> Result<String>;
}
