//! Crawl request representation.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Delimiter joining the keywords into a single search term.
pub const KEYWORD_DELIMITER: &str = ",";

/// Result types the search page is known to serve.
///
/// The request's `type` is passed through verbatim; this list is only used
/// to flag values the upstream will probably ignore.
pub const KNOWN_RESULT_TYPES: [&str; 3] = ["repositories", "issues", "wikis"];

/// A crawl request as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Search keywords, joined with [`KEYWORD_DELIMITER`].
    pub keywords: Vec<String>,
    /// Proxy entries to pick from.
    pub proxies: Vec<String>,
    /// Result type, e.g. "repositories".
    #[serde(rename = "type")]
    pub result_type: String,
}

impl CrawlRequest {
    /// Creates a new crawl request.
    pub fn new<K, P>(keywords: K, proxies: P, result_type: impl Into<String>) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            proxies: proxies.into_iter().map(Into::into).collect(),
            result_type: result_type.into(),
        }
    }

    /// Returns the keywords joined into one search term.
    pub fn search_term(&self) -> String {
        self.keywords.join(KEYWORD_DELIMITER)
    }

    /// Whether the result type is one of [`KNOWN_RESULT_TYPES`].
    pub fn has_known_type(&self) -> bool {
        KNOWN_RESULT_TYPES.contains(&self.result_type.as_str())
    }

    /// Builds the search URL for this request on top of `base`.
    ///
    /// `q` and `type` are percent-encoded so reserved characters in the
    /// keywords survive the trip. Query parameters already present in
    /// `base` are kept in front.
    pub fn search_url(&self, base: &str) -> Result<String> {
        let mut url = url::Url::parse(base)?;
        let query = format!(
            "q={}&type={}",
            urlencoding::encode(&self.search_term()),
            urlencoding::encode(&self.result_type)
        );
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, query),
            _ => query,
        };
        url.set_query(Some(&query));
        Ok(url.into())
    }
}
