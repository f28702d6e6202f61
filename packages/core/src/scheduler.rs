//! Ingestion scheduler.
//!
//! A cycle fetches every configured source into the store, then rewrites the
//! export artifacts. [`run_periodic`] repeats cycles on a fixed interval
//! until shutdown; cycles never overlap.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::AppError;
use crate::export::{run_exports, ExportPaths};
use crate::feeds::{FeedProvider, FeedSource};
use crate::metrics::AppMetrics;
use crate::pipeline::{ingest, CycleReport};
use crate::repository::ArticleRepository;

/// Everything one cycle needs. Built once at startup.
pub struct CycleRunner {
    provider: Arc<dyn FeedProvider + Send + Sync>,
    repository: Arc<ArticleRepository>,
    sources: Vec<FeedSource>,
    export_paths: ExportPaths,
    metrics: Arc<AppMetrics>,
}

impl CycleRunner {
    pub fn new(
        provider: Arc<dyn FeedProvider + Send + Sync>,
        repository: Arc<ArticleRepository>,
        sources: Vec<FeedSource>,
        export_paths: ExportPaths,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            provider,
            repository,
            sources,
            export_paths,
            metrics,
        }
    }

    /// Run one full cycle, logging instead of returning errors.
    pub async fn run_cycle(&self) {
        if let Err(err) = self.try_run_cycle().await {
            tracing::error!("Ingestion cycle aborted: {}", err);
        }
    }

    /// Run one full cycle.
    ///
    /// Only storage failures are returned; per-source fetch failures end up
    /// in the report and export failures are logged.
    pub async fn try_run_cycle(&self) -> Result<CycleReport, AppError> {
        tracing::info!("Ingestion cycle started ({} sources)", self.sources.len());

        let report = ingest(self.provider.as_ref(), &self.repository, &self.sources).await?;
        report.log();
        self.metrics.record_cycle(&report);

        let exports = run_exports(&self.repository, &self.export_paths).await;
        if !exports.all_ok() {
            tracing::warn!("Some export artifacts were not refreshed this cycle");
        }

        let stored = self.repository.count().await?;
        self.metrics.articles_stored.set(stored as f64);

        tracing::info!("Ingestion cycle finished, {} articles stored", stored);
        Ok(report)
    }
}

/// Run a cycle every `period` until `Ctrl+C` (SIGINT) is received.
///
/// The first cycle runs one `period` after the call; startup runs its own
/// cycle before scheduling.
pub async fn run_periodic(runner: Arc<CycleRunner>, period: Duration) {
    run_periodic_until(runner, period, async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Cannot listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    })
    .await;
}

/// Like [`run_periodic`] but stops when `shutdown` completes. A cycle in
/// progress is finished first.
pub async fn run_periodic_until<F>(runner: Arc<CycleRunner>, period: Duration, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!("Ingestion scheduler started (interval: {}s)", period.as_secs());

    loop {
        tokio::select! {
            _ = interval.tick() => {
                runner.run_cycle().await;
            }

            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received. Stopping scheduler.");
                break;
            }
        }
    }

    tracing::info!("Ingestion scheduler stopped cleanly");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use crate::feeds::{FetchError, RawEntry};
    use crate::services::mock_feed::MockFeedProvider;

    async fn make_repo() -> Arc<ArticleRepository> {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = ArticleRepository::new(pool);
        repo.reset().await.unwrap();
        Arc::new(repo)
    }

    fn entry(link: &str) -> RawEntry {
        RawEntry {
            title: Some("Headline".into()),
            link: Some(link.into()),
            ..RawEntry::default()
        }
    }

    fn make_runner(
        provider: MockFeedProvider,
        repo: Arc<ArticleRepository>,
        dir: &std::path::Path,
    ) -> (CycleRunner, Arc<AppMetrics>) {
        let metrics = Arc::new(AppMetrics::new().unwrap());
        let runner = CycleRunner::new(
            Arc::new(provider),
            repo,
            vec![
                FeedSource::new("A", "US", "https://a.example/rss"),
                FeedSource::new("B", "FR", "https://b.example/rss"),
            ],
            ExportPaths::in_dir(dir),
            metrics.clone(),
        );
        (runner, metrics)
    }

    #[tokio::test]
    async fn cycle_ingests_and_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let repo = make_repo().await;
        let provider = MockFeedProvider::new()
            .with_entries("https://a.example/rss", vec![entry("https://a/1")])
            .with_entries("https://b.example/rss", vec![entry("https://b/1")]);
        let (runner, metrics) = make_runner(provider, repo.clone(), dir.path());

        let report = runner.try_run_cycle().await.unwrap();

        assert_eq!(report.inserted(), 2);
        let paths = ExportPaths::in_dir(dir.path());
        assert!(paths.csv.exists());
        assert!(paths.json.exists());
        assert!(paths.summary.exists());
        assert!((metrics.articles_stored.get() - 2.0).abs() < f64::EPSILON);
        assert!((metrics.cycles_total.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn cycle_with_failed_source_still_exports() {
        let dir = tempfile::tempdir().unwrap();
        let repo = make_repo().await;
        let provider = MockFeedProvider::new()
            .with_error("https://a.example/rss", FetchError::Status { status: 500 })
            .with_entries("https://b.example/rss", vec![entry("https://b/1")]);
        let (runner, metrics) = make_runner(provider, repo.clone(), dir.path());

        runner.run_cycle().await;

        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(ExportPaths::in_dir(dir.path()).summary.exists());
        assert!((metrics.source_failures_total.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn cycle_aborts_on_storage_failure_without_exports() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = Arc::new(ArticleRepository::new(pool));
        let provider = MockFeedProvider::new()
            .with_entries("https://a.example/rss", vec![entry("https://a/1")]);
        let (runner, _) = make_runner(provider, repo, dir.path());

        let err = runner.try_run_cycle().await.unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert!(!ExportPaths::in_dir(dir.path()).summary.exists());
    }

    #[tokio::test]
    async fn periodic_runner_waits_one_period_before_first_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let repo = make_repo().await;
        let provider = MockFeedProvider::new();
        let (runner, metrics) = make_runner(provider, repo, dir.path());

        run_periodic_until(
            Arc::new(runner),
            Duration::from_secs(60),
            time::sleep(Duration::from_millis(20)),
        )
        .await;

        assert_eq!(metrics.cycles_total.get() as u64, 0);
    }

    #[tokio::test]
    async fn periodic_runner_repeats_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let repo = make_repo().await;
        let provider = MockFeedProvider::new();
        let (runner, metrics) = make_runner(provider, repo, dir.path());

        run_periodic_until(
            Arc::new(runner),
            Duration::from_millis(40),
            time::sleep(Duration::from_millis(170)),
        )
        .await;

        assert!(metrics.cycles_total.get() as u64 >= 2);
    }
}
