//! Process configuration.
//!
//! Every setting is a CLI flag with an environment-variable fallback, so a
//! `.env` file loaded at startup configures the service the same way flags do.

use std::time::Duration;

use clap::Args;

use crate::crawler::{ClearPolicy, CrawlerConfig, WritePolicy, DEFAULT_SEARCH_URL};
use crate::fetcher_http::HttpFetcher;

/// Settings of the HTTP service.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Service name reported in logs
    #[arg(long, env = "PROJECT_NAME", default_value = "github-crawler")]
    pub project_name: String,

    /// Address to bind
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "APP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Development reload flag (accepted for compatibility, has no effect)
    #[arg(long, env = "APP_RELOAD")]
    pub reload: bool,

    /// Allowed CORS origins (comma-separated, `*` for any)
    #[arg(long, env = "ALLOW_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub allow_origins: Vec<String>,

    /// Path prefix of the API routes
    #[arg(long, env = "API_V1_STR", default_value = "/api/v1")]
    pub api_prefix: String,

    #[command(flatten)]
    pub crawler: CrawlerArgs,
}

impl Settings {
    /// Returns the `host:port` pair to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the API prefix with one leading slash and no trailing slash.
    /// An empty result means the routes sit at the root.
    pub fn normalized_api_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

/// Settings of the crawl pipeline, shared by `serve` and `crawl`.
#[derive(Debug, Clone, Args)]
pub struct CrawlerArgs {
    /// Search endpoint the crawler queries
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_SEARCH_URL)]
    pub github_api_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Connect timeout in seconds
    #[arg(long, env = "CONNECT_TIMEOUT", default_value_t = 10)]
    pub connect_timeout: u64,

    /// Empty the results as soon as a crawl starts
    #[arg(long, env = "CLEAR_ON_START")]
    pub clear_on_start: bool,

    /// Let the most recently triggered crawl own the results
    #[arg(long, env = "LATEST_TRIGGER_WINS")]
    pub latest_trigger_wins: bool,
}

impl CrawlerArgs {
    /// Builds the crawler configuration.
    pub fn crawler_config(&self) -> CrawlerConfig {
        let clear_policy = if self.clear_on_start {
            ClearPolicy::OnStart
        } else {
            ClearPolicy::OnCompletion
        };
        let write_policy = if self.latest_trigger_wins {
            WritePolicy::LatestTrigger
        } else {
            WritePolicy::LastCompletion
        };

        CrawlerConfig::default()
            .with_search_url(&self.github_api_url)
            // Headroom over the request timeout for connect and extraction.
            .with_timeout(Duration::from_secs(self.timeout + self.connect_timeout))
            .with_clear_policy(clear_policy)
            .with_write_policy(write_policy)
    }

    /// Builds the HTTP fetcher.
    pub fn fetcher(&self) -> HttpFetcher {
        HttpFetcher::new()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    fn parse(args: &[&str]) -> Settings {
        let argv = std::iter::once("test").chain(args.iter().copied());
        TestCli::try_parse_from(argv).unwrap().settings
    }

    #[test]
    fn test_settings_defaults() {
        let settings = parse(&[]);
        assert_eq!(settings.project_name, "github-crawler");
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8000);
        assert!(!settings.reload);
        assert_eq!(settings.allow_origins, vec!["*"]);
        assert_eq!(settings.api_prefix, "/api/v1");
        assert_eq!(settings.crawler.github_api_url, DEFAULT_SEARCH_URL);
        assert_eq!(settings.crawler.timeout, 30);
        assert_eq!(settings.crawler.connect_timeout, 10);
        assert!(!settings.crawler.clear_on_start);
        assert!(!settings.crawler.latest_trigger_wins);
    }

    #[test]
    fn test_settings_flags() {
        let settings = parse(&[
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--allow-origins",
            "http://a.test,http://b.test",
            "--api-prefix",
            "/api/v2/",
            "--github-api-url",
            "http://localhost:1234/search",
            "--clear-on-start",
            "--latest-trigger-wins",
        ]);
        assert_eq!(settings.bind_addr(), "127.0.0.1:9000");
        assert_eq!(settings.allow_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(settings.normalized_api_prefix(), "/api/v2");

        let config = settings.crawler.crawler_config();
        assert_eq!(config.search_url, "http://localhost:1234/search");
        assert_eq!(config.clear_policy, ClearPolicy::OnStart);
        assert_eq!(config.write_policy, WritePolicy::LatestTrigger);
    }

    #[test]
    fn test_normalized_api_prefix() {
        let mut settings = parse(&[]);
        assert_eq!(settings.normalized_api_prefix(), "/api/v1");

        settings.api_prefix = "api".to_string();
        assert_eq!(settings.normalized_api_prefix(), "/api");

        settings.api_prefix = "/".to_string();
        assert_eq!(settings.normalized_api_prefix(), "");
    }

    #[test]
    fn test_crawler_config_timeout_covers_request() {
        let settings = parse(&["--timeout", "5", "--connect-timeout", "2"]);
        let config = settings.crawler.crawler_config();
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(settings.crawler.fetcher().timeout(), Duration::from_secs(5));
    }
}
