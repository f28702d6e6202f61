use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;

use news_aggregator::api;
use news_aggregator::cli::Cli;
use news_aggregator::config::Config;
use news_aggregator::db::create_pool;
use news_aggregator::error::AppError;
use news_aggregator::export::{remove_stale_summary, ExportPaths};
use news_aggregator::feeds::load_sources;
use news_aggregator::logging::init_logging;
use news_aggregator::metrics::AppMetrics;
use news_aggregator::repository::ArticleRepository;
use news_aggregator::scheduler::{run_periodic, CycleRunner};
use news_aggregator::services::feed_client::FeedClient;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env()?.with_cli(&cli)?;
    tracing::info!("Service started with config: {:?}", config);

    let sources = load_sources(&config.feeds_file)?;
    tracing::info!(
        "Loaded {} feed sources from {}",
        sources.len(),
        config.feeds_file.display()
    );

    let pool = create_pool(&config.database_url).await?;
    let repository = Arc::new(ArticleRepository::new(pool));
    repository.reset().await?;

    let export_paths = ExportPaths::in_dir(&config.export_dir);
    remove_stale_summary(&export_paths.summary).await?;

    let metrics = Arc::new(
        AppMetrics::new()
            .map_err(|err| AppError::Config(format!("Cannot register metrics: {}", err)))?,
    );
    let provider = Arc::new(FeedClient::new(config.feed_timeout)?);

    let runner = Arc::new(CycleRunner::new(
        provider,
        repository.clone(),
        sources,
        export_paths.clone(),
        metrics.clone(),
    ));

    // Startup cycle. A storage failure here is fatal.
    runner.try_run_cycle().await?;

    if cli.once {
        tracing::info!("Single cycle requested, exiting");
        return Ok(());
    }

    let scheduler = tokio::spawn(run_periodic(runner, config.ingest_interval));

    let app = api::router(repository, export_paths.summary, metrics);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("HTTP API listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(err) = scheduler.await {
        tracing::error!("Scheduler task failed: {}", err);
    }

    tracing::info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
