//! Export snapshots and the per-country summary.
//!
//! Each artifact is rebuilt from the whole store and replaces the previous
//! file. Bytes go to a temp file next to the target first and are renamed
//! into place, so readers see either the old or the new file.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AppError;
use crate::repository::{Article, ArticleRepository};

pub const CSV_EXPORT_FILE: &str = "news_export.csv";
pub const JSON_EXPORT_FILE: &str = "news_export.json";
pub const SUMMARY_FILE: &str = "news_summary.json";

const EXPORT_COLUMNS: [&str; 7] = [
    "title",
    "published",
    "source",
    "country",
    "summary",
    "url",
    "language",
];

/// Where the three artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub summary: PathBuf,
}

impl ExportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            csv: dir.join(CSV_EXPORT_FILE),
            json: dir.join(JSON_EXPORT_FILE),
            summary: dir.join(SUMMARY_FILE),
        }
    }
}

/// Flat export row. The store id is internal and not exported.
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    title: &'a str,
    published: &'a str,
    source: &'a str,
    country: &'a str,
    summary: &'a str,
    url: &'a str,
    language: &'a str,
}

impl<'a> From<&'a Article> for ExportRecord<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            title: &article.title,
            published: &article.published,
            source: &article.source,
            country: &article.country,
            summary: &article.summary,
            url: &article.url,
            language: &article.language,
        }
    }
}

/// Which export steps succeeded this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub csv: bool,
    pub json: bool,
    pub summary: bool,
}

impl ExportReport {
    pub fn all_ok(&self) -> bool {
        self.csv && self.json && self.summary
    }
}

/// Write all articles as CSV with a header row. Returns the row count.
pub async fn export_csv(repository: &ArticleRepository, path: &Path) -> Result<usize, AppError> {
    let articles = repository.all_articles().await?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for article in &articles {
        writer.serialize(ExportRecord::from(article))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::Io(err.into_error()))?;

    write_atomically(path, &bytes).await?;
    Ok(articles.len())
}

/// Write all articles as a pretty-printed JSON array. Returns the row count.
pub async fn export_json(repository: &ArticleRepository, path: &Path) -> Result<usize, AppError> {
    let articles = repository.all_articles().await?;
    let records: Vec<ExportRecord<'_>> = articles.iter().map(ExportRecord::from).collect();

    let bytes = serde_json::to_vec_pretty(&records)?;
    write_atomically(path, &bytes).await?;
    Ok(articles.len())
}

/// Recompute the per-country rollup and write it. Returns the group count.
pub async fn write_summary(repository: &ArticleRepository, path: &Path) -> Result<usize, AppError> {
    let summary = repository.aggregate_by_country().await?;

    let bytes = serde_json::to_vec_pretty(&summary)?;
    write_atomically(path, &bytes).await?;
    Ok(summary.len())
}

/// Run the three export steps independently. A failing step is logged and
/// the remaining steps still run.
pub async fn run_exports(repository: &ArticleRepository, paths: &ExportPaths) -> ExportReport {
    let csv = log_step("CSV export", &paths.csv, export_csv(repository, &paths.csv).await);
    let json = log_step("JSON export", &paths.json, export_json(repository, &paths.json).await);
    let summary = log_step(
        "Summary",
        &paths.summary,
        write_summary(repository, &paths.summary).await,
    );

    ExportReport { csv, json, summary }
}

fn log_step(step: &str, path: &Path, result: Result<usize, AppError>) -> bool {
    match result {
        Ok(rows) => {
            tracing::info!("{} written to {} ({} rows)", step, path.display(), rows);
            true
        }
        Err(err) => {
            tracing::error!("{} to {} failed: {}", step, path.display(), err);
            false
        }
    }
}

/// Delete a summary left behind by an earlier process. Missing is fine.
pub async fn remove_stale_summary(path: &Path) -> Result<(), AppError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::info!("Removed stale summary {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(AppError::Io(err)),
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
