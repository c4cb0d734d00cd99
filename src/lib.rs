//! # github-crawler
//!
//! Crawls GitHub search result pages through rotating proxies and keeps the
//! URLs of the latest crawl available for readers.
//!
//! The pipeline is:
//!
//! - pick a proxy at random from the request's list
//! - fetch the search page through it, accepting only `200 OK`
//! - extract the links of every `div.search-title` hit
//! - replace the shared [`ResultStore`] batch in one step
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use github_crawler::{CrawlRequest, Crawler, CrawlerConfig, HttpFetcher, ResultStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(ResultStore::new());
//!     let crawler = Arc::new(Crawler::new(
//!         HttpFetcher::new(),
//!         Arc::clone(&store),
//!         CrawlerConfig::default(),
//!     ));
//!
//!     let request = CrawlRequest::new(["rust", "parser"], ["127.0.0.1:8080"], "repositories");
//!     crawler.start(request)?.wait().await?;
//!
//!     for record in store.latest().unwrap_or_default().iter() {
//!         println!("{}", record.url);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod request;
mod result;

pub mod api;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetcher;
pub mod fetcher_http;
pub mod proxy;
pub mod store;

pub use crawler::{ClearPolicy, CrawlHandle, Crawler, CrawlerConfig, JobState, JobStatus, WritePolicy};
pub use error::{CrawlerError, Result};
pub use extract::extract;
pub use fetcher::PageFetcher;
pub use fetcher_http::HttpFetcher;
pub use request::{CrawlRequest, KNOWN_RESULT_TYPES};
pub use result::{ResultBatch, ResultRecord, GITHUB_ORIGIN};
pub use store::ResultStore;
