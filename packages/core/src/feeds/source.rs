use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A configured syndication endpoint.
///
/// `country` is attached to every article ingested from this source; it is
/// never derived from the article itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub country: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: &str, country: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            country: country.to_string(),
            url: url.to_string(),
        }
    }
}

/// Load the ordered feed list from a JSON file.
///
/// The file holds an array of `{"name", "country", "url"}` objects. Order is
/// preserved; it is the order sources are polled in each cycle.
pub fn load_sources(path: &Path) -> Result<Vec<FeedSource>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        AppError::Config(format!("Cannot read feeds file {}: {}", path.display(), err))
    })?;
    parse_sources(&raw)
        .map_err(|msg| AppError::Config(format!("Invalid feeds file {}: {}", path.display(), msg)))
}

fn parse_sources(raw: &str) -> Result<Vec<FeedSource>, String> {
    let sources: Vec<FeedSource> = serde_json::from_str(raw).map_err(|err| err.to_string())?;

    if sources.is_empty() {
        return Err("no feed sources configured".to_string());
    }
    if let Some(bad) = sources.iter().find(|s| s.url.trim().is_empty()) {
        return Err(format!("feed source {:?} has an empty url", bad.name));
    }

    Ok(sources)
}
