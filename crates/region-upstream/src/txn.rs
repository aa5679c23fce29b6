//! Transaction log range queries.
//!
//! The primary pipeline bounds its change sets with a monotonic snapshot
//! marker (the lowest in-progress transaction id). The log itself lives
//! with the database layer; tests and self-contained runs use the
//! in-memory implementation.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::UpstreamError;

/// One committed transaction's worth of changes.
#[derive(Debug, Clone)]
pub struct TxnRecord {
    /// Transaction id, monotonic
    pub xid: u64,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Entities whose bodies changed
    pub updated: Vec<Uuid>,
    /// Entities whose identifiers changed
    pub renamed: Vec<Uuid>,
}

/// Range queries over the upstream transaction log.
#[async_trait]
pub trait TxnLog: Send + Sync {
    /// Records with `xid >= cursor`, ordered by xid. `None` means the
    /// whole log.
    async fn changes_since(&self, cursor: Option<u64>) -> Result<Vec<TxnRecord>, UpstreamError>;

    /// The current snapshot marker: lowest transaction id still in
    /// progress, i.e. where the next cycle should resume from.
    async fn snapshot_marker(&self) -> Result<u64, UpstreamError>;
}

/// In-memory log for tests and self-contained runs.
#[derive(Default)]
pub struct MemoryTxnLog {
    records: RwLock<Vec<TxnRecord>>,
}

impl MemoryTxnLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed transaction record.
    pub fn push(&self, record: TxnRecord) {
        self.records.write().expect("txn log lock poisoned").push(record);
    }
}

#[async_trait]
impl TxnLog for MemoryTxnLog {
    async fn changes_since(&self, cursor: Option<u64>) -> Result<Vec<TxnRecord>, UpstreamError> {
        let records = self.records.read().expect("txn log lock poisoned");
        let mut out: Vec<TxnRecord> = records
            .iter()
            .filter(|r| cursor.map(|c| r.xid >= c).unwrap_or(true))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.xid);
        Ok(out)
    }

    async fn snapshot_marker(&self) -> Result<u64, UpstreamError> {
        let records = self.records.read().expect("txn log lock poisoned");
        Ok(records.iter().map(|r| r.xid).max().map(|x| x + 1).unwrap_or(0))
    }
}
