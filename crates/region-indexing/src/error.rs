//! Error types for the reconciliation core.

use region_parser::ParseError;
use region_search::SearchError;
use region_upstream::UpstreamError;
use thiserror::Error;

/// Errors that can occur during an indexing cycle.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Target or meta index operation failed
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Upstream collaborator failed
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Interval source could not be read
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Persisted state record did not decode
    #[error("state error: {0}")]
    State(String),
}

impl From<serde_json::Error> for IndexingError {
    fn from(err: serde_json::Error) -> Self {
        IndexingError::State(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexingError::State("bad record".to_string());
        assert_eq!(err.to_string(), "state error: bad record");
    }
}
