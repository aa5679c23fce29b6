//! Interval parser for tab-separated genomic sources.
//!
//! One raw-row tokenizer feeds two independent row grammars:
//! - peak rows: `(chromosome, start, end)` positional intervals
//! - quantification rows: transcript/gene expression levels
//!
//! Malformed rows are skipped with a warning, never aborting the batch.

pub mod decode;
pub mod error;
pub mod peaks;
pub mod quantification;
mod rows;

pub use decode::decode_source;
pub use error::ParseError;
pub use peaks::{parse_peaks, PeakParse};
pub use quantification::{parse_quantifications, QuantParse};
