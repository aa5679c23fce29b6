//! Change-set resolution: which entities does this cycle touch.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use region_search::SEARCH_MAX;
use region_types::CycleStatus;
use region_upstream::{EntitySource, TxnLog};

use crate::candidacy::indexed_assays;
use crate::error::IndexingError;
use crate::state::StateStore;

/// Why this cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// Primary indexer has not finished its first pass; do nothing
    Uninitialized,
    /// Override or forced set: reprocess with force
    Reindex,
    /// Prior cycle was interrupted; policy is to skip, not reprocess
    Restart,
    /// Regular staged hand-off (or transaction-log) cycle
    Normal,
}

/// Resolution result: the batch and how to treat it.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub kind: CycleKind,
    pub uuids: Vec<Uuid>,
    /// Bypass the residency check when projecting
    pub force: bool,
    /// Snapshot marker observed during resolution, to commit at close
    pub cursor: Option<u64>,
    /// Transaction records examined, when the log strategy ran
    pub txn_count: Option<u64>,
}

impl ChangeSet {
    fn empty(kind: CycleKind) -> Self {
        Self {
            kind,
            uuids: Vec::new(),
            force: false,
            cursor: None,
            txn_count: None,
        }
    }
}

/// Union of changes in a transaction-log range.
#[derive(Debug, Clone)]
pub struct TxnRange {
    /// Updated ∪ renamed identifiers, deduplicated
    pub uuids: Vec<Uuid>,
    /// Records examined
    pub txn_count: u64,
    /// Highest transaction id seen
    pub max_xid: Option<u64>,
    /// Earliest commit timestamp seen
    pub first_timestamp: Option<DateTime<Utc>>,
}

/// Query the transaction log from a cursor and fold the records into one
/// invalidation set. This is the primary-pipeline strategy.
pub async fn resolve_txn_range(
    log: &dyn TxnLog,
    cursor: Option<u64>,
) -> Result<TxnRange, IndexingError> {
    let records = log.changes_since(cursor).await?;

    let mut uuids = BTreeSet::new();
    let mut max_xid = None;
    let mut first_timestamp: Option<DateTime<Utc>> = None;
    for record in &records {
        uuids.extend(record.updated.iter().copied());
        uuids.extend(record.renamed.iter().copied());
        max_xid = max_xid.max(Some(record.xid));
        first_timestamp = match first_timestamp {
            Some(t) => Some(t.min(record.timestamp)),
            None => Some(record.timestamp),
        };
    }

    Ok(TxnRange {
        uuids: uuids.into_iter().collect(),
        txn_count: records.len() as u64,
        max_xid,
        first_timestamp,
    })
}

/// Resolves the batch for one cycle from the state store and the
/// upstream entity universe.
pub struct ChangeSetResolver<'a> {
    state: &'a StateStore,
    source: &'a dyn EntitySource,
}

impl<'a> ChangeSetResolver<'a> {
    pub fn new(state: &'a StateStore, source: &'a dyn EntitySource) -> Self {
        Self { state, source }
    }

    /// Walk the priority ladder: uninitialized, override, forced set,
    /// restart, then the normal staged hand-off.
    pub async fn resolve(&self) -> Result<ChangeSet, IndexingError> {
        // Until the primary indexer has completed a pass there is nothing
        // coherent to read; drop any stale override or staged work.
        if !self.state.primary_initialized().await? {
            self.state.take_reindex_request().await?;
            self.state.take_staged().await?;
            let mut state = self.state.load_state().await?;
            state.status = CycleStatus::Uninitialized;
            self.state.save_state(&state).await?;
            return Ok(ChangeSet::empty(CycleKind::Uninitialized));
        }

        // A full primary reindex floods the hand-off list; wait it out.
        if let Some(count) = self.state.primary_cycle_count().await? {
            if count > SEARCH_MAX {
                return Ok(ChangeSet::empty(CycleKind::Uninitialized));
            }
        }

        if self.state.take_reindex_request().await? {
            // The forced set is cleared together with the flag.
            self.state.take_force_uuids().await?;
            let uuids = match self.source.eligible_entities(&indexed_assays()).await {
                Ok(uuids) => uuids,
                Err(e) => {
                    // Precision lost, liveness kept: reindex the whole
                    // universe of the root type instead of stalling.
                    warn!(error = %e, "eligibility scan failed, falling back to full universe");
                    self.source.all_entities().await?
                }
            };
            warn!(count = uuids.len(), "override: reindexing all with force");
            return Ok(ChangeSet {
                kind: CycleKind::Reindex,
                uuids,
                force: true,
                cursor: None,
                txn_count: None,
            });
        }

        let forced = self.state.take_force_uuids().await?;
        if !forced.is_empty() {
            warn!(count = forced.len(), "override: reindexing selected set with force");
            return Ok(ChangeSet {
                kind: CycleKind::Reindex,
                uuids: forced,
                force: true,
                cursor: None,
                txn_count: None,
            });
        }

        let state = self.state.load_state().await?;
        if state.status == CycleStatus::Indexing {
            let uuids = self.state.todo_uuids().await?;
            return Ok(ChangeSet {
                kind: CycleKind::Restart,
                uuids,
                force: false,
                cursor: None,
                txn_count: None,
            });
        }

        self.resolve_staged().await
    }

    /// Normal cycle: drain whatever the primary pipeline staged.
    ///
    /// The drain is read-then-delete and not atomic with staging; an id
    /// appended between the two steps is lost. Known gap in the hand-off
    /// contract, deliberately not papered over with locking.
    async fn resolve_staged(&self) -> Result<ChangeSet, IndexingError> {
        let staged = self.state.take_staged().await?;
        if staged.is_empty() {
            return Ok(ChangeSet::empty(CycleKind::Normal));
        }

        let mut cursor: Option<u64> = None;
        let mut uuids = BTreeSet::new();
        for item in &staged {
            if let Some(marker) = item.strip_prefix("xmin:") {
                if let Ok(xmin) = marker.parse::<u64>() {
                    cursor = cursor.max(Some(xmin));
                }
            } else if let Ok(uuid) = item.parse::<Uuid>() {
                uuids.insert(uuid);
            }
        }

        let uuids: Vec<Uuid> = if uuids.is_empty() {
            Vec::new()
        } else {
            // One extra scan buys a smaller per-entity fetch bill.
            let eligible: BTreeSet<Uuid> = self
                .source
                .eligible_entities(&indexed_assays())
                .await?
                .into_iter()
                .collect();
            uuids.intersection(&eligible).copied().collect()
        };

        Ok(ChangeSet {
            kind: CycleKind::Normal,
            uuids,
            force: false,
            cursor,
            txn_count: None,
        })
    }

    /// Primary-pipeline strategy: bound the batch by a transaction-log
    /// range instead of the staged list. Used when the trigger carries an
    /// explicit cursor and a log is available.
    pub async fn resolve_from_txn_log(
        &self,
        log: &dyn TxnLog,
        last_cursor: Option<u64>,
    ) -> Result<ChangeSet, IndexingError> {
        let range = resolve_txn_range(log, last_cursor).await?;
        if range.txn_count == 0 {
            return Ok(ChangeSet {
                txn_count: Some(0),
                ..ChangeSet::empty(CycleKind::Normal)
            });
        }

        let marker = log.snapshot_marker().await?;
        let eligible: BTreeSet<Uuid> = self
            .source
            .eligible_entities(&indexed_assays())
            .await?
            .into_iter()
            .collect();
        let uuids: Vec<Uuid> = range
            .uuids
            .iter()
            .filter(|u| eligible.contains(u))
            .copied()
            .collect();

        Ok(ChangeSet {
            kind: CycleKind::Normal,
            uuids,
            force: false,
            cursor: Some(marker),
            txn_count: Some(range.txn_count),
        })
    }
}
