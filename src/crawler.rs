//! Crawl job orchestration.
//!
//! A job picks a proxy, builds the search URL, fetches the page, extracts the
//! hits and publishes them to the [`ResultStore`]. [`Crawler::start`] runs the
//! job on a background task and hands back a [`CrawlHandle`];
//! [`Crawler::run`] runs it in the caller's task.
//!
//! By default the previous batch stays visible while a job is in flight and
//! the job that completes last owns the store, whichever was triggered
//! first. [`ClearPolicy`] and [`WritePolicy`] switch to clearing on start and
//! to latest-trigger-wins respectively.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::extract::extract;
use crate::fetcher::{search_headers, PageFetcher};
use crate::proxy::{choose_proxy, parse_proxies, ProxyConfig};
use crate::request::CrawlRequest;
use crate::result::ResultBatch;
use crate::store::ResultStore;
use crate::{CrawlerError, Result};

/// Search endpoint used when none is configured.
pub const DEFAULT_SEARCH_URL: &str = "https://github.com/search";

/// When a job empties the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearPolicy {
    /// Keep the previous batch visible until the new one is ready.
    #[default]
    OnCompletion,
    /// Empty the store as soon as a job starts.
    OnStart,
}

/// Which of several overlapping jobs ends up in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// The job that completes last wins.
    #[default]
    LastCompletion,
    /// The job that was triggered last wins; batches of superseded jobs
    /// are dropped.
    LatestTrigger,
}

/// Configuration for a [`Crawler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// Base URL of the search endpoint.
    pub search_url: String,
    /// Upper bound on fetch plus extraction for one job.
    pub timeout: Duration,
    /// When the store is emptied.
    pub clear_policy: ClearPolicy,
    /// How overlapping jobs are ordered.
    pub write_policy: WritePolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: Duration::from_secs(30),
            clear_policy: ClearPolicy::default(),
            write_policy: WritePolicy::default(),
        }
    }
}

impl CrawlerConfig {
    /// Sets the search endpoint.
    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }

    /// Sets the job timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the clear policy.
    pub fn with_clear_policy(mut self, clear_policy: ClearPolicy) -> Self {
        self.clear_policy = clear_policy;
        self
    }

    /// Sets the write policy.
    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }
}

/// State of a crawl job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum JobState {
    /// Fetch or extraction in progress.
    Running,
    /// Finished and published.
    Succeeded {
        /// Number of records extracted.
        results: usize,
    },
    /// Finished with an error.
    Failed {
        /// Error message.
        error: String,
    },
}

/// State of the most recently triggered job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    /// Job id, increasing with every trigger.
    pub id: u64,
    /// Current state.
    #[serde(flatten)]
    pub state: JobState,
}

/// Handle to a crawl running in the background.
///
/// Dropping the handle detaches the job; it still runs to completion.
#[derive(Debug)]
pub struct CrawlHandle {
    id: u64,
    handle: JoinHandle<Result<ResultBatch>>,
}

impl CrawlHandle {
    /// Returns the job id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns whether the job has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the job and returns its outcome.
    pub async fn wait(self) -> Result<ResultBatch> {
        let id = self.id;
        self.handle
            .await
            .map_err(|e| CrawlerError::Other(format!("Crawl job {} aborted: {}", id, e)))?
    }
}

/// A job whose proxy and URL are settled.
#[derive(Debug)]
struct PreparedJob {
    id: u64,
    url: String,
    proxy: ProxyConfig,
}

/// Runs crawl jobs and publishes their results.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<ResultStore>,
    config: CrawlerConfig,
    next_id: AtomicU64,
    status: RwLock<Option<JobStatus>>,
}

impl Crawler {
    /// Creates a crawler publishing into `store`.
    pub fn new<F: PageFetcher + 'static>(
        fetcher: F,
        store: Arc<ResultStore>,
        config: CrawlerConfig,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store,
            config,
            next_id: AtomicU64::new(0),
            status: RwLock::new(None),
        }
    }

    /// Returns the store this crawler publishes into.
    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Returns the state of the most recently triggered job.
    pub fn status(&self) -> Option<JobStatus> {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs a crawl job to completion in the current task.
    pub async fn run(&self, request: &CrawlRequest) -> Result<ResultBatch> {
        let job = self.prepare(request)?;
        self.execute(job).await
    }

    /// Starts a crawl job on a background task.
    ///
    /// Proxy selection and URL construction happen before returning, so an
    /// empty proxy list or a bad proxy entry rejects the trigger itself.
    /// Everything after that is only visible through the handle, the logs,
    /// [`Crawler::status`] and the store.
    pub fn start(self: &Arc<Self>, request: CrawlRequest) -> Result<CrawlHandle> {
        let job = self.prepare(&request)?;
        let id = job.id;
        let crawler = Arc::clone(self);
        let handle = tokio::spawn(async move { crawler.execute(job).await });
        Ok(CrawlHandle { id, handle })
    }

    fn prepare(&self, request: &CrawlRequest) -> Result<PreparedJob> {
        let proxies = parse_proxies(&request.proxies)?;
        let proxy = choose_proxy(&proxies)?.clone();
        let url = request.search_url(&self.config.search_url)?;

        if !request.has_known_type() {
            debug!("Passing unknown result type '{}' upstream", request.result_type);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if self.config.clear_policy == ClearPolicy::OnStart {
            match self.config.write_policy {
                WritePolicy::LastCompletion => self.store.clear(),
                WritePolicy::LatestTrigger => self.store.clear_for(id),
            }
        }
        self.record_status(id, JobState::Running);

        info!(
            "Crawl job {} started for '{}' ({})",
            id,
            request.search_term(),
            request.result_type
        );
        Ok(PreparedJob { id, url, proxy })
    }

    async fn execute(&self, job: PreparedJob) -> Result<ResultBatch> {
        let outcome = match timeout(self.config.timeout, self.fetch_and_extract(&job)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CrawlerError::Timeout(self.config.timeout)),
        };

        match &outcome {
            Ok(batch) => {
                self.publish(job.id, batch.clone());
                self.record_status(
                    job.id,
                    JobState::Succeeded {
                        results: batch.len(),
                    },
                );
                info!("Crawl job {} extracted {} results", job.id, batch.len());
            }
            Err(e) => {
                error!("Crawl job {} failed: {}", job.id, e);
                self.record_status(
                    job.id,
                    JobState::Failed {
                        error: e.to_string(),
                    },
                );
            }
        }

        outcome
    }

    async fn fetch_and_extract(&self, job: &PreparedJob) -> Result<ResultBatch> {
        let html = self
            .fetcher
            .fetch(&job.url, &job.proxy, &search_headers())
            .await?;

        extract(&html).map_err(|e| match e {
            CrawlerError::ParsingFailed(_) => e,
            other => CrawlerError::ParsingFailed(other.to_string()),
        })
    }

    fn publish(&self, id: u64, batch: ResultBatch) {
        match self.config.write_policy {
            WritePolicy::LastCompletion => self.store.replace(batch),
            WritePolicy::LatestTrigger => {
                if !self.store.replace_if_current(id, batch) {
                    debug!("Crawl job {} superseded, dropping its results", id);
                }
            }
        }
    }

    /// Records `state` unless a later job has already been triggered.
    fn record_status(&self, id: u64, state: JobState) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        if status.as_ref().map_or(true, |current| current.id <= id) {
            *status = Some(JobStatus { id, state });
        }
    }
}
