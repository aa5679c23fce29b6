//! Error types for upstream collaborators.

use region_search::SearchError;
use thiserror::Error;

/// Errors from the upstream contract implementations.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// HTTP transport failure while fetching
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Primary document index failure
    #[error("primary store error: {0}")]
    Search(#[from] SearchError),

    /// Snapshot payload did not decode
    #[error("malformed upstream document: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        UpstreamError::Malformed(err.to_string())
    }
}
