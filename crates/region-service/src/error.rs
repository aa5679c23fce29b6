//! Error types for the service layer.

use region_indexing::IndexingError;
use thiserror::Error;

/// Errors surfaced to the hosting layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// State store could not be read or written
    #[error("indexing error: {0}")]
    Indexing(#[from] IndexingError),
}
