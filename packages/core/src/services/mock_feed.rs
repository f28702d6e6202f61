//! In-process feed provider for tests.
//!
//! Responses are keyed by feed URL. A URL with nothing configured yields an
//! empty feed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::feeds::{FeedProvider, FeedSource, FetchError, RawEntry};

#[derive(Clone, Default)]
pub struct MockFeedProvider {
    responses: HashMap<String, Result<Vec<RawEntry>, FetchError>>,
    calls: Arc<AtomicUsize>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockFeedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(mut self, url: &str, entries: Vec<RawEntry>) -> Self {
        self.responses.insert(url.to_string(), Ok(entries));
        self
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(url.to_string(), Err(error));
        self
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs fetched so far, in call order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FeedProvider for MockFeedProvider {
    async fn fetch_entries(&self, source: &FeedSource) -> Result<Vec<RawEntry>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut urls) = self.fetched.lock() {
            urls.push(source.url.clone());
        }
        self.responses
            .get(&source.url)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_configured_entries_and_errors() {
        let provider = MockFeedProvider::new()
            .with_entries(
                "https://ok.example/rss",
                vec![RawEntry {
                    title: Some("One".into()),
                    ..RawEntry::default()
                }],
            )
            .with_error("https://bad.example/rss", FetchError::Status { status: 404 });

        let ok = tokio_test::block_on(
            provider.fetch_entries(&FeedSource::new("Ok", "US", "https://ok.example/rss")),
        );
        let bad = tokio_test::block_on(
            provider.fetch_entries(&FeedSource::new("Bad", "US", "https://bad.example/rss")),
        );

        assert_eq!(ok.unwrap().len(), 1);
        assert_eq!(bad.unwrap_err(), FetchError::Status { status: 404 });
    }

    #[test]
    fn unknown_url_is_an_empty_feed_and_is_recorded() {
        let provider = MockFeedProvider::new();
        let source = FeedSource::new("Quiet", "FR", "https://quiet.example/rss");

        let entries = tokio_test::block_on(provider.fetch_entries(&source)).unwrap();

        assert!(entries.is_empty());
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.fetched_urls(), vec!["https://quiet.example/rss"]);
    }
}
