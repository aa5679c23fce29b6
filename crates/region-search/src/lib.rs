//! Search-engine capability for the region-index pipeline.
//!
//! The search engine itself is an external collaborator; this crate
//! defines the capability surface the pipeline needs (document get/put/
//! delete, index and mapping creation, bulk scan, count) plus two
//! implementations:
//!
//! - [`MemoryEngine`]: in-process engine for tests and self-contained runs
//! - [`HttpEngine`]: thin client for an Elasticsearch-style REST server
//!
//! Index settings and mapping bodies for the region schema live in
//! [`schema`].

pub mod engine;
pub mod error;
pub mod http;
pub mod memory;
pub mod schema;

pub use engine::{ensure_schema, SearchEngine, SEARCH_MAX};
pub use error::SearchError;
pub use http::HttpEngine;
pub use memory::MemoryEngine;
pub use schema::{
    expression_mapping, index_settings, region_mapping, residency_mapping, META_DOCTYPE,
    META_INDEX, RESIDENT_DATASETS_INDEX, RESIDENT_DOCTYPE,
};
