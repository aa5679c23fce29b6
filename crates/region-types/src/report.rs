//! Structured bodies returned by the trigger and state endpoints.

use serde::{Deserialize, Serialize};

/// Lifecycle status of the indexing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Primary indexer has not completed its first pass yet
    Uninitialized,
    /// A cycle is in flight (or was interrupted mid-flight)
    Indexing,
    /// Last cycle closed cleanly
    Done,
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleStatus::Uninitialized => write!(f, "uninitialized"),
            CycleStatus::Indexing => write!(f, "indexing"),
            CycleStatus::Done => write!(f, "done"),
        }
    }
}

/// Report returned by the trigger endpoint after each invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    /// Indexer title, namespaces the state keys
    pub title: String,
    /// Status after this invocation
    pub status: CycleStatus,
    /// Snapshot marker recorded by this cycle, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
    /// Snapshot marker the cycle started from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cursor: Option<u64>,
    /// Transaction records examined (primary-pipeline strategy only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_count: Option<u64>,
    /// Files added plus files dropped this cycle
    pub indexed: usize,
    /// Files projected into the index this cycle
    pub added: usize,
    /// Files removed from the index this cycle
    pub dropped: usize,
    /// Completed cycle counter
    pub cycles: u64,
    /// Wall-clock seconds the cycle took
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_took: Option<f64>,
    /// Per-entity error strings accumulated during the cycle
    pub errors: Vec<String>,
}

impl CycleReport {
    /// An empty report for a cycle that did no work.
    pub fn empty(title: impl Into<String>, status: CycleStatus) -> Self {
        Self {
            title: title.into(),
            status,
            cursor: None,
            last_cursor: None,
            txn_count: None,
            indexed: 0,
            added: 0,
            dropped: 0,
            cycles: 0,
            errors: Vec::new(),
            cycle_took: None,
        }
    }
}

/// Body of the state inspection endpoint: the durable record plus counts
/// derived live from the stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDisplay {
    /// Indexer title
    pub title: String,
    /// Current status
    pub status: CycleStatus,
    /// Last committed snapshot marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
    /// Completed cycle counter
    pub cycles: u64,
    /// Identifiers staged by the primary indexer, not yet drained
    pub staged_to_process: u64,
    /// Files added during the last cycle
    pub files_added: u64,
    /// Files dropped during the last cycle
    pub files_dropped: u64,
    /// Datasets queued for a forced reindex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasets_to_force: Option<u64>,
    /// Documents resident in the target index, when countable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_in_index: Option<u64>,
    /// Errors recorded by the last cycle
    pub errors: Vec<String>,
}
