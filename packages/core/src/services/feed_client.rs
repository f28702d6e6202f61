use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;
use crate::feeds::parser::parse_feed;
use crate::feeds::{FeedProvider, FeedSource, FetchError, RawEntry};

const USER_AGENT: &str = concat!("news-aggregator/", env!("CARGO_PKG_VERSION"));

/// HTTP feed provider.
#[derive(Clone)]
pub struct FeedClient {
    http: Client,
}

impl FeedClient {
    /// Build a client. Without a timeout a stalled server blocks the caller
    /// until the connection drops.
    pub fn new(timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| AppError::Config(format!("Cannot build HTTP client: {}", err)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl FeedProvider for FeedClient {
    async fn fetch_entries(&self, source: &FeedSource) -> Result<Vec<RawEntry>, FetchError> {
        let response = self
            .http
            .get(&source.url)
            .send()
            .await
            .map_err(|err| FetchError::request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::request(err.to_string()))?;

        parse_feed(&body)
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}
