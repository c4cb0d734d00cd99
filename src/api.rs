//! HTTP endpoints for triggering crawls and reading their results.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::crawler::Crawler;
use crate::request::CrawlRequest;
use crate::store::ResultStore;
use crate::CrawlerError;

/// Path of the crawler routes below the API prefix.
pub const CRAWLER_PATH: &str = "/crawler/github_crawler";

/// Shared handler state: the write side and the read side of the store.
#[derive(Clone)]
pub struct AppState {
    /// Runs crawl jobs.
    pub crawler: Arc<Crawler>,
    /// Latest results, read without touching the crawler.
    pub store: Arc<ResultStore>,
}

impl AppState {
    /// Creates the state for `crawler`, reading from the store it publishes to.
    pub fn new(crawler: Arc<Crawler>) -> Self {
        let store = Arc::clone(crawler.store());
        Self { crawler, store }
    }
}

/// Routes of the crawler, without prefix or middleware.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(CRAWLER_PATH, post(start_crawl))
        .route(&format!("{}/results", CRAWLER_PATH), get(latest_results))
        .route(&format!("{}/status", CRAWLER_PATH), get(crawl_status))
        .with_state(state)
}

/// Full application: routes under the configured prefix with CORS and
/// request tracing.
pub fn app(state: AppState, settings: &Settings) -> Router {
    let prefix = settings.normalized_api_prefix();
    let router = if prefix.is_empty() {
        routes(state)
    } else {
        Router::new().nest(&prefix, routes(state))
    };

    router
        .layer(cors_layer(&settings.allow_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins.
///
/// A `*` entry allows any origin without credentials; explicit origins are
/// allowed with credentials, mirroring the requested methods and headers.
pub fn cors_layer(allow_origins: &[String]) -> CorsLayer {
    if allow_origins.iter().any(|origin| origin.trim() == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allow_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

fn error_response(err: CrawlerError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// Starts a crawl and acknowledges without waiting for it.
async fn start_crawl(
    State(state): State<AppState>,
    Json(request): Json<CrawlRequest>,
) -> Response {
    match state.crawler.start(request) {
        Ok(handle) => {
            debug!("Crawl job {} scheduled", handle.id());
            (StatusCode::OK, Json(json!({ "status": "Crawling started." }))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Returns the latest batch.
async fn latest_results(State(state): State<AppState>) -> Response {
    match state.store.latest() {
        Some(batch) if !batch.is_empty() => Json(batch.as_ref().clone()).into_response(),
        _ => Json(json!({ "status": "No results available." })).into_response(),
    }
}

/// Returns the state of the most recently triggered crawl.
async fn crawl_status(State(state): State<AppState>) -> Response {
    match state.crawler.status() {
        Some(status) => Json(status).into_response(),
        None => Json(json!({ "status": "No crawl started." })).into_response(),
    }
}
