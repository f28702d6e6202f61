//! HTTP API.
//!
//! Routes:
//! - `GET /health`                : liveness
//! - `GET /metrics`               : Prometheus text format
//! - `GET /news`                  : filtered article list
//! - `GET /news/summary/download` : latest per-country summary

pub mod health;
pub mod news;
pub mod summary;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::metrics::{metrics_endpoint, track_http, AppMetrics};
use crate::repository::ArticleRepository;

/// Assemble the full router.
pub fn router(
    repository: Arc<ArticleRepository>,
    summary_path: PathBuf,
    metrics: Arc<AppMetrics>,
) -> Router {
    let news = Router::new()
        .route("/news", get(news::list_news))
        .with_state(repository);

    let summary = Router::new()
        .route("/news/summary/download", get(summary::download_summary))
        .with_state(Arc::new(summary_path));

    let observability = Router::new()
        .route("/metrics", get(metrics_endpoint))
        .with_state(metrics.clone());

    Router::new()
        .route("/health", get(health::health))
        .merge(news)
        .merge(summary)
        .merge(observability)
        .layer(middleware::from_fn_with_state(metrics, track_http))
        .layer(CorsLayer::permissive())
}
