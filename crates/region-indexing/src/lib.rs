//! Reconciliation core for the region search index.
//!
//! This crate keeps a region-keyed search index consistent with the
//! upstream primary document store:
//!
//! 1. The [`ChangeSetResolver`] decides which entities changed since the
//!    last committed cursor (staged hand-off, override, forced list, or
//!    transaction-log range).
//! 2. The eligibility predicates in [`candidacy`] decide, per entity and
//!    per file, what is in scope. Pure functions, no I/O.
//! 3. The [`RegionProjector`] turns parsed intervals into per-chromosome
//!    documents plus a residency record, and removes them symmetrically.
//! 4. The [`StateStore`] records todo/done/last sets, counters, and the
//!    cursor, durably, in the search engine itself.
//! 5. The [`RegionPipeline`] drives one full cycle and always closes it
//!    through `finish_cycle`, so a crash mid-cycle is detectable on the
//!    next invocation.

pub mod candidacy;
pub mod error;
pub mod pipeline;
pub mod projector;
pub mod resolver;
pub mod state;

pub use candidacy::{candidate_entity, candidate_file, indexed_assays, ALLOWED_FILE_FORMATS};
pub use error::IndexingError;
pub use pipeline::{CycleOptions, RegionPipeline};
pub use projector::RegionProjector;
pub use resolver::{resolve_txn_range, ChangeSet, ChangeSetResolver, CycleKind, TxnRange};
pub use state::{finish_cycle, start_cycle, CycleState, StateStore};
