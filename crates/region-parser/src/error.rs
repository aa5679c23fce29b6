//! Error types for the interval parser.

use thiserror::Error;

/// Errors that can occur while reading a source.
///
/// Row-level problems are not errors: a malformed row is skipped and
/// counted, so only the byte source itself can fail a parse.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Reading from the byte source failed
    #[error("I/O error reading source: {0}")]
    Io(#[from] std::io::Error),
}
