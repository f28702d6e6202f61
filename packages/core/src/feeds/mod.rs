//! Feed sources and feed retrieval.
//!
//! A [`FeedSource`] names one syndication endpoint. A [`FeedProvider`]
//! turns a source into raw [`RawEntry`] values; the HTTP implementation
//! lives in [`crate::services::feed_client`].

pub mod entry;
pub mod error;
pub mod parser;
pub mod provider;
pub mod source;

pub use entry::RawEntry;
pub use error::FetchError;
pub use provider::{fetch_source, FeedEntries, FeedProvider};
pub use source::{load_sources, FeedSource};
