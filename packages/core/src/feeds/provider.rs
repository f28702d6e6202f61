//! Feed Provider Interface
//!
//! Decouples the ingestion pipeline from how feeds are retrieved.

use async_trait::async_trait;

use super::{FeedSource, FetchError, RawEntry};

/// Single-pass sequence of entries produced by one fetch.
pub type FeedEntries = std::vec::IntoIter<RawEntry>;

/// Retrieves and parses the feed behind one [`FeedSource`].
#[async_trait]
pub trait FeedProvider {
    /// Fetch and parse the feed. One attempt, no retries.
    async fn fetch_entries(&self, source: &FeedSource) -> Result<Vec<RawEntry>, FetchError>;

    /// Name of this provider for logging/debugging.
    fn provider_name(&self) -> &str;
}

/// Fetch one source, logging a failure before handing it back.
///
/// The caller decides what a failure means for the cycle; this function
/// only guarantees that nothing panics or escapes unlogged.
pub async fn fetch_source(
    provider: &(dyn FeedProvider + Send + Sync),
    source: &FeedSource,
) -> Result<FeedEntries, FetchError> {
    tracing::info!(source = %source.name, country = %source.country, "Fetching feed");

    match provider.fetch_entries(source).await {
        Ok(entries) => {
            tracing::debug!(
                source = %source.name,
                entries = entries.len(),
                provider = provider.provider_name(),
                "Feed parsed"
            );
            Ok(entries.into_iter())
        }
        Err(err) => {
            tracing::warn!(source = %source.name, url = %source.url, "Feed fetch failed: {}", err);
            Err(err)
        }
    }
}
