//! Ingestion pipeline.
//!
//! Polls every configured source in order, normalizes each entry and
//! inserts it unless its url is already stored. A source that fails to
//! fetch is recorded in the [`CycleReport`] and skipped; the next source is
//! processed regardless. Only a storage failure ends the pass early.

use serde::Serialize;

use crate::error::AppError;
use crate::feeds::{fetch_source, FeedProvider, FeedSource};
use crate::normalize::normalize_entry;
use crate::repository::ArticleRepository;

/// What happened to one source during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Fetched {
        entries: usize,
        inserted: usize,
        duplicates: usize,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub country: String,
    pub outcome: SourceOutcome,
}

/// Per-source outcomes of one ingestion pass, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub sources: Vec<SourceReport>,
}

impl CycleReport {
    pub fn inserted(&self) -> usize {
        self.fetched_totals().1
    }

    pub fn duplicates(&self) -> usize {
        self.fetched_totals().2
    }

    pub fn entries(&self) -> usize {
        self.fetched_totals().0
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|r| matches!(r.outcome, SourceOutcome::Failed { .. }))
    }

    fn fetched_totals(&self) -> (usize, usize, usize) {
        self.sources
            .iter()
            .fold((0, 0, 0), |acc, report| match report.outcome {
                SourceOutcome::Fetched {
                    entries,
                    inserted,
                    duplicates,
                } => (acc.0 + entries, acc.1 + inserted, acc.2 + duplicates),
                SourceOutcome::Failed { .. } => acc,
            })
    }

    /// One warning per failed source, then a single summary line.
    pub fn log(&self) {
        for report in self.failures() {
            if let SourceOutcome::Failed { reason } = &report.outcome {
                tracing::warn!(
                    source = %report.source,
                    country = %report.country,
                    "Source skipped this cycle: {}",
                    reason
                );
            }
        }

        tracing::info!(
            "Ingestion finished: {} sources, {} failed, {} entries, {} new, {} duplicates",
            self.sources.len(),
            self.failures().count(),
            self.entries(),
            self.inserted(),
            self.duplicates(),
        );
    }
}

/// Run one ingestion pass over `sources`, strictly one source at a time.
pub async fn ingest(
    provider: &(dyn FeedProvider + Send + Sync),
    repository: &ArticleRepository,
    sources: &[FeedSource],
) -> Result<CycleReport, AppError> {
    let mut report = CycleReport::default();

    for source in sources {
        let outcome = match fetch_source(provider, source).await {
            Ok(entries) => {
                let mut stats = (0, 0, 0);
                for entry in entries {
                    let article = normalize_entry(source, &entry);
                    stats.0 += 1;
                    if repository.insert_if_absent(&article).await? {
                        stats.1 += 1;
                    } else {
                        stats.2 += 1;
                    }
                }
                SourceOutcome::Fetched {
                    entries: stats.0,
                    inserted: stats.1,
                    duplicates: stats.2,
                }
            }
            Err(err) => SourceOutcome::Failed {
                reason: err.to_string(),
            },
        };

        report.sources.push(SourceReport {
            source: source.name.clone(),
            country: source.country.clone(),
            outcome,
        });
    }

    Ok(report)
}
