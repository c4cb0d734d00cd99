//! Crawl result types.

use serde::{Deserialize, Serialize};

/// Origin prepended to the relative links found on a search page.
pub const GITHUB_ORIGIN: &str = "https://github.com";

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Absolute URL of the hit.
    pub url: String,
}

impl ResultRecord {
    /// Creates a record from an absolute URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Creates a record from a link found on a search page.
    ///
    /// The link is appended to [`GITHUB_ORIGIN`] verbatim, without
    /// normalization or validation.
    pub fn from_href(href: &str) -> Self {
        Self {
            url: format!("{}{}", GITHUB_ORIGIN, href),
        }
    }
}

/// Records of one crawl, in document order.
pub type ResultBatch = Vec<ResultRecord>;
