//! GitHub crawler service and CLI.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use github_crawler::{
    api::{self, AppState},
    config::{CrawlerArgs, Settings},
    CrawlRequest, Crawler, ResultStore,
};

/// GitHub search crawler with proxy rotation
#[derive(Parser)]
#[command(name = "github-crawler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the crawler HTTP API
    Serve(Settings),

    /// Run a single crawl and print its results
    Crawl(CrawlArgs),
}

#[derive(Parser)]
struct CrawlArgs {
    /// Search keywords
    #[arg(required = true)]
    keywords: Vec<String>,

    /// Proxy to route through (repeatable, one is picked at random)
    #[arg(short, long = "proxy", required = true)]
    proxies: Vec<String>,

    /// Result type (repositories, issues, wikis)
    #[arg(short = 't', long = "type", default_value = "repositories")]
    result_type: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(flatten)]
    crawler: CrawlerArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// One URL per line
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Serve(settings) => serve(settings).await,
        Commands::Crawl(args) => crawl(args).await,
    }
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("github_crawler=debug,tower_http=debug,info")
        } else {
            EnvFilter::new("github_crawler=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_crawler(args: &CrawlerArgs) -> Arc<Crawler> {
    Arc::new(Crawler::new(
        args.fetcher(),
        Arc::new(ResultStore::new()),
        args.crawler_config(),
    ))
}

async fn serve(settings: Settings) -> Result<()> {
    if settings.reload {
        warn!("APP_RELOAD is set but hot reload is not supported; ignoring");
    }

    let crawler = build_crawler(&settings.crawler);
    let app = api::app(AppState::new(crawler), &settings);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    info!(
        "{} listening on {} (API prefix '{}', upstream {})",
        settings.project_name,
        listener.local_addr()?,
        settings.normalized_api_prefix(),
        settings.crawler.github_api_url
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn crawl(args: CrawlArgs) -> Result<()> {
    let crawler = build_crawler(&args.crawler);
    let request = CrawlRequest::new(args.keywords, args.proxies, args.result_type);
    let results = crawler.run(&request).await?;

    match args.format {
        OutputFormat::Text => {
            println!(
                "\nResults for \"{}\" ({}): {}\n",
                request.search_term(),
                request.result_type,
                results.len()
            );
            for (i, record) in results.iter().enumerate() {
                println!("{}. {}", i + 1, record.url);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Compact => {
            for record in &results {
                println!("{}", record.url);
            }
        }
    }

    Ok(())
}
