//! Error types for the search capability.

use thiserror::Error;

/// Errors surfaced by a search engine implementation.
#[derive(Error, Debug)]
pub enum SearchError {
    /// HTTP transport failure
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a status the operation cannot interpret
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Delete or update against a document that does not exist
    #[error("document not found: {index}/{id}")]
    NotFound { index: String, id: String },

    /// JSON encoding/decoding failure
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}
