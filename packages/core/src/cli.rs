use std::path::PathBuf;

use clap::Parser;

/// News aggregator CLI arguments.
///
/// Every flag is optional and overrides the matching environment variable.
#[derive(Debug, Default, Parser)]
#[command(
    name = "news-aggregator",
    version,
    about = "Periodically ingests news feeds into a local store and exports snapshots"
)]
pub struct Cli {
    /// SQLite database URL (e.g. sqlite://news.db)
    #[arg(long)]
    pub database_url: Option<String>,

    /// JSON file listing the feed sources
    #[arg(long)]
    pub feeds: Option<PathBuf>,

    /// Directory the CSV/JSON exports and the summary are written to
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Hours between ingestion cycles
    #[arg(long)]
    pub interval_hours: Option<u64>,

    /// Address the HTTP API binds to
    #[arg(long)]
    pub bind: Option<String>,

    /// Run a single ingestion cycle and exit without serving HTTP
    #[arg(long)]
    pub once: bool,
}
