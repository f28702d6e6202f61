//! `GET /news`: read-only filtered view over the article store.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::repository::{Article, ArticleFilter, ArticleRepository};

/// Shared state for the news routes.
pub type NewsState = Arc<ArticleRepository>;

/// `GET /news?country=&language=&start_date=&end_date=`
///
/// An empty array means nothing matched; store failures are a 500.
pub async fn list_news(
    State(repo): State<NewsState>,
    Query(filter): Query<ArticleFilter>,
) -> Result<Json<Vec<Article>>, (StatusCode, Json<Value>)> {
    let articles = repo.query_all(&filter).await.map_err(|err| {
        tracing::error!("News query failed: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
    })?;

    Ok(Json(articles))
}
