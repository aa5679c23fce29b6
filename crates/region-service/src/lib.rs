//! Endpoint handlers for the region indexer.
//!
//! The web framework and routing layer are the host's business; this
//! crate exposes the two endpoint behaviors as plain async methods
//! returning serializable bodies:
//!
//! - [`RegionIndexService::index_regions`]: run one cycle (the trigger)
//! - [`RegionIndexService::indexer_state`]: inspect state and derived
//!   counts, optionally requesting a full reindex

pub mod error;
pub mod service;

pub use error::ServiceError;
pub use service::{RegionIndexService, StateParams, TriggerParams};
