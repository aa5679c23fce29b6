//! Upstream collaborator contract for the region-index pipeline.
//!
//! The primary document store, its transaction log, and the file hosting
//! layer are owned by the surrounding system. This crate defines the
//! capability traits the pipeline consumes:
//!
//! - [`EntitySource`]: entity snapshot fetch and eligibility scans
//! - [`TxnLog`]: transaction log range queries by cursor
//! - [`FileFetcher`]: raw file content fetch with HTTP-style status
//!
//! plus production implementations where they are in reach:
//! [`SearchEntitySource`] reads the primary document index through the
//! search capability, and [`HttpFileFetcher`] downloads file bodies.

pub mod entities;
pub mod error;
pub mod fetch;
pub mod txn;

pub use entities::{EntitySource, SearchEntitySource};
pub use error::UpstreamError;
pub use fetch::{FetchedFile, FileFetcher, HttpFileFetcher};
pub use txn::{MemoryTxnLog, TxnLog, TxnRecord};
