//! Article store.
//!
//! All SQLite read/write logic lives here. The pipeline calls
//! [`ArticleRepository::insert_if_absent`] once per normalized entry; the
//! exporter and the `/news` handler only read.
//!
//! The schema is not migrated. [`ArticleRepository::reset`] drops and
//! recreates the table and is meant to run once, at startup.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::normalize::{CANONICAL_DATE_FORMAT, MISSING};

/// A stored article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub published: String,
    pub source: String,
    pub country: String,
    pub summary: String,
    pub url: String,
    pub language: String,
}

/// An article that has not been stored yet; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub published: String,
    pub source: String,
    pub country: String,
    pub summary: String,
    pub url: String,
    pub language: String,
}

/// Optional filters for [`ArticleRepository::query_all`].
///
/// Empty strings count as "not set".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    pub country: Option<String>,
    pub language: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Per-country rollup written to the summary artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub country: String,
    pub news_agencies: Vec<String>,
    pub total_articles: i64,
    pub historical_since: String,
}

const ARTICLE_COLUMNS: &str = "id, title, published, source, country, summary, url, language";

/// Repository for reading and writing articles to SQLite.
#[derive(Debug, Clone)]
pub struct ArticleRepository {
    pool: SqlitePool,
}

impl ArticleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Drop the article table and recreate it empty.
    pub async fn reset(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DROP TABLE IF EXISTS articles")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "CREATE TABLE articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                published TEXT NOT NULL,
                source TEXT NOT NULL,
                country TEXT NOT NULL,
                summary TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                language TEXT NOT NULL
            )",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Article table reset");
        Ok(())
    }

    /// Insert unless an article with the same url exists.
    /// Returns `true` if a row was written.
    ///
    /// A single statement against the `UNIQUE(url)` constraint, so two calls
    /// for the same url can never both insert.
    pub async fn insert_if_absent(&self, article: &NewArticle) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO articles
             (title, published, source, country, summary, url, language)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&article.title)
        .bind(&article.published)
        .bind(&article.source)
        .bind(&article.country)
        .bind(&article.summary)
        .bind(&article.url)
        .bind(&article.language)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Articles matching `filter`, newest `published` first.
    ///
    /// `published` is compared and sorted as text. Dates that could not be
    /// canonicalized keep their raw feed format and do not order correctly
    /// against canonical ones.
    pub async fn query_all(&self, filter: &ArticleFilter) -> Result<Vec<Article>, sqlx::Error> {
        let country = present(&filter.country).map(str::to_lowercase);
        let language = present(&filter.language).map(str::to_lowercase);
        let start_date = present(&filter.start_date);
        let end_date = present(&filter.end_date);

        let mut conditions = vec!["1=1"];
        if country.is_some() {
            conditions.push("LOWER(country) = ?");
        }
        if language.is_some() {
            conditions.push("LOWER(language) = ?");
        }
        if start_date.is_some() {
            conditions.push("published >= ?");
        }
        if end_date.is_some() {
            conditions.push("published <= ?");
        }

        let sql = format!(
            "SELECT {} FROM articles WHERE {} ORDER BY published DESC",
            ARTICLE_COLUMNS,
            conditions.join(" AND ")
        );

        let mut q = sqlx::query(&sql);
        if let Some(country) = &country {
            q = q.bind(country);
        }
        if let Some(language) = &language {
            q = q.bind(language);
        }
        if let Some(start) = start_date {
            q = q.bind(start);
        }
        if let Some(end) = end_date {
            q = q.bind(end);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(article_from_row).collect()
    }

    /// Every article in insertion order. Used by the exporters.
    pub async fn all_articles(&self) -> Result<Vec<Article>, sqlx::Error> {
        let sql = format!("SELECT {} FROM articles ORDER BY id ASC", ARTICLE_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(article_from_row).collect()
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM articles")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("total")
    }

    /// Group all articles by country: distinct sources, article count and
    /// the earliest `published` value as a calendar date.
    pub async fn aggregate_by_country(&self) -> Result<Vec<SummaryEntry>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let groups = sqlx::query(
            "SELECT country, COUNT(*) AS total, MIN(published) AS earliest
             FROM articles
             GROUP BY country
             ORDER BY country ASC",
        )
        .fetch_all(&mut *tx)
        .await?;

        let pairs = sqlx::query(
            "SELECT DISTINCT country, source FROM articles ORDER BY country ASC, source ASC",
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut agencies: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in &pairs {
            let country: String = row.try_get("country")?;
            let source: String = row.try_get("source")?;
            agencies.entry(country).or_default().push(source);
        }

        groups
            .iter()
            .map(|row| -> Result<SummaryEntry, sqlx::Error> {
                let country: String = row.try_get("country")?;
                let total_articles: i64 = row.try_get("total")?;
                let earliest: Option<String> = row.try_get("earliest")?;

                Ok(SummaryEntry {
                    news_agencies: agencies.remove(&country).unwrap_or_default(),
                    country,
                    total_articles,
                    historical_since: historical_since(earliest.as_deref()),
                })
            })
            .collect()
    }
}

fn article_from_row(row: &SqliteRow) -> Result<Article, sqlx::Error> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        published: row.try_get("published")?,
        source: row.try_get("source")?,
        country: row.try_get("country")?,
        summary: row.try_get("summary")?,
        url: row.try_get("url")?,
        language: row.try_get("language")?,
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// `YYYY-MM-DD` for a canonical timestamp, `"N/A"` for anything else.
fn historical_since(earliest: Option<&str>) -> String {
    earliest
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, CANONICAL_DATE_FORMAT).ok())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}
