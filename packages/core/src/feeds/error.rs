//! Per-source fetch errors.

use thiserror::Error;

/// Why a single feed source produced no entries this cycle.
///
/// These never abort a cycle; the pipeline records them in the report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed: {message}")]
    Request { message: String },

    #[error("Feed returned HTTP {status}")]
    Status { status: u16 },

    #[error("Malformed feed: {message}")]
    Parse { message: String },
}

impl FetchError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request { message: message.into() }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into() }
    }
}
