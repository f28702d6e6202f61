use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://news.db";
pub const DEFAULT_FEEDS_FILE: &str = "feeds.json";
pub const DEFAULT_INTERVAL_HOURS: u64 = 5;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub feeds_file: PathBuf,
    pub export_dir: PathBuf,
    pub ingest_interval: Duration,
    pub bind_addr: String,
    /// Per-request feed timeout. `None` lets a slow feed block the cycle.
    pub feed_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup so tests do not have to
    /// touch process-wide environment variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let feeds_file = lookup("FEEDS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FEEDS_FILE));

        let export_dir = lookup("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let interval_hours = match lookup("INGEST_INTERVAL_HOURS") {
            Some(raw) => parse_positive("INGEST_INTERVAL_HOURS", &raw)?,
            None => DEFAULT_INTERVAL_HOURS,
        };

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let feed_timeout = lookup("FEED_TIMEOUT_SECONDS")
            .map(|raw| parse_positive("FEED_TIMEOUT_SECONDS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            database_url,
            feeds_file,
            export_dir,
            ingest_interval: hours("INGEST_INTERVAL_HOURS", interval_hours)?,
            bind_addr,
            feed_timeout,
        })
    }

    /// Overlay command-line flags on top of the environment.
    pub fn with_cli(mut self, cli: &Cli) -> Result<Self, AppError> {
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
        }
        if let Some(path) = &cli.feeds {
            self.feeds_file = path.clone();
        }
        if let Some(dir) = &cli.export_dir {
            self.export_dir = dir.clone();
        }
        if let Some(h) = cli.interval_hours {
            if h == 0 {
                return Err(AppError::Config(
                    "--interval-hours must be greater than zero".into(),
                ));
            }
            self.ingest_interval = hours("--interval-hours", h)?;
        }
        if let Some(bind) = &cli.bind {
            self.bind_addr = bind.clone();
        }
        Ok(self)
    }
}

fn hours(key: &str, h: u64) -> Result<Duration, AppError> {
    h.checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| AppError::Config(format!("{} is too large: {} hours", key, h)))
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::Config(format!("{} must be greater than zero", key))),
        Ok(v) => Ok(v),
        Err(_) => Err(AppError::Config(format!(
            "{} must be a valid number, got {:?}",
            key, raw
        ))),
    }
}
