//! `GET /news/summary/download`: the latest summary artifact.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Path of the summary file written by the exporter.
pub type SummaryState = Arc<PathBuf>;

pub const SUMMARY_NOT_FOUND: &str = "Summary file not found. Please wait for the next update.";

/// Serve the summary as an attachment.
///
/// A summary that has not been generated yet is a 404, which is distinct
/// from a generated-but-empty `[]` summary.
pub async fn download_summary(
    State(path): State<SummaryState>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let bytes = match tokio::fs::read(path.as_path()).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": SUMMARY_NOT_FOUND })),
            ));
        }
        Err(err) => {
            tracing::error!("Failed to read summary {}: {}", path.display(), err);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("Failed to read summary: {}", err) })),
            ));
        }
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::export::SUMMARY_FILE.to_string());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        Body::from(bytes),
    )
        .into_response())
}
