//! Durable cycle state, stored in the search engine itself.
//!
//! The state store is a namespaced key/value and list store over the meta
//! index: every key is a document id, a list is a document holding a
//! single `list` array. Cycle transitions are pure functions over the
//! [`CycleState`] record; the store persists what they return.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use region_search::{SearchEngine, SearchError, META_DOCTYPE, META_INDEX};
use region_types::CycleStatus;

use crate::error::IndexingError;

/// Durable record for one indexing role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleState {
    /// Role title, namespaces every key
    pub title: String,
    /// Lifecycle status
    pub status: CycleStatus,
    /// Last committed snapshot marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
    /// Completed cycle counter
    #[serde(default)]
    pub cycles: u64,
    /// Files added plus dropped by the last completed cycle
    #[serde(default)]
    pub indexed: usize,
    /// Errors recorded by the last completed cycle
    #[serde(default)]
    pub errors: Vec<String>,
    /// When the in-flight cycle started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_started: Option<DateTime<Utc>>,
    /// Wall-clock seconds the last completed cycle took
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_took: Option<f64>,
}

impl CycleState {
    /// Fresh record for a role that has never run.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: CycleStatus::Uninitialized,
            cursor: None,
            cycles: 0,
            indexed: 0,
            errors: Vec::new(),
            cycle_started: None,
            cycle_took: None,
        }
    }
}

/// Open a cycle: status moves to `indexing` and the start time is pinned.
/// Last-cycle accounting is cleared so the record only ever describes one
/// cycle at a time.
pub fn start_cycle(mut state: CycleState, now: DateTime<Utc>) -> CycleState {
    state.status = CycleStatus::Indexing;
    state.cycle_started = Some(now);
    state.indexed = 0;
    state.errors = Vec::new();
    state.cycle_took = None;
    state
}

/// Close a cycle: counters land, the cursor commits, status returns to
/// `done`. Every cycle must end here: a record left in `indexing` is how
/// the next invocation detects an interrupted run.
pub fn finish_cycle(
    mut state: CycleState,
    added: usize,
    dropped: usize,
    errors: Vec<String>,
    cursor: Option<u64>,
    now: DateTime<Utc>,
) -> CycleState {
    state.indexed = added + dropped;
    state.errors = errors;
    if cursor.is_some() {
        state.cursor = cursor;
    }
    state.cycles += 1;
    state.cycle_took = state
        .cycle_started
        .map(|started| (now - started).num_milliseconds() as f64 / 1000.0);
    state.cycle_started = None;
    state.status = CycleStatus::Done;
    state
}

/// Namespaced key/value and list store for one indexing role.
pub struct StateStore {
    engine: Arc<dyn SearchEngine>,
    title: String,
}

impl StateStore {
    /// Store for the given role title (e.g. `"regions"`).
    pub fn new(engine: Arc<dyn SearchEngine>, title: impl Into<String>) -> Self {
        Self {
            engine,
            title: title.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    // Key names. The staged list and the primary markers are shared with
    // the primary indexer and are not namespaced by this role's title.

    fn state_key(&self) -> String {
        format!("{}_indexer", self.title)
    }

    fn todo_key(&self) -> String {
        format!("{}_todo", self.title)
    }

    fn last_key(&self) -> String {
        format!("{}_last", self.title)
    }

    fn files_added_key(&self) -> String {
        format!("{}_files_added", self.title)
    }

    fn files_dropped_key(&self) -> String {
        format!("{}_files_dropped", self.title)
    }

    fn override_key(&self) -> String {
        format!("{}_reindex_requested", self.title)
    }

    fn force_key(&self) -> String {
        format!("{}_force_dataset_uuids", self.title)
    }

    fn staged_key(&self) -> String {
        format!("staged_for_{}", self.title)
    }

    // Raw object and list operations against the meta index.

    pub async fn get_obj(&self, key: &str) -> Result<Option<Value>, IndexingError> {
        Ok(self.engine.get_doc(META_INDEX, META_DOCTYPE, key).await?)
    }

    pub async fn put_obj(&self, key: &str, value: Value) -> Result<(), IndexingError> {
        self.engine
            .put_doc(META_INDEX, META_DOCTYPE, key, value)
            .await?;
        Ok(())
    }

    /// Delete keys, ignoring the ones that are already absent.
    pub async fn delete_objs(&self, keys: &[&str]) -> Result<(), IndexingError> {
        for key in keys {
            match self.engine.delete_doc(META_INDEX, META_DOCTYPE, key).await {
                Ok(()) | Err(SearchError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub async fn get_list(&self, key: &str) -> Result<Vec<String>, IndexingError> {
        let doc = self.get_obj(key).await?;
        Ok(doc
            .and_then(|d| d.get("list").cloned())
            .and_then(|l| serde_json::from_value(l).ok())
            .unwrap_or_default())
    }

    pub async fn put_list(&self, key: &str, items: &[String]) -> Result<(), IndexingError> {
        self.put_obj(key, json!({ "list": items })).await
    }

    pub async fn list_extend(&self, key: &str, items: &[String]) -> Result<(), IndexingError> {
        let mut list = self.get_list(key).await?;
        list.extend(items.iter().cloned());
        self.put_list(key, &list).await
    }

    pub async fn list_count(&self, key: &str) -> Result<u64, IndexingError> {
        Ok(self.get_list(key).await?.len() as u64)
    }

    /// Move a list from one key to another, replacing the destination.
    pub async fn rename_list(&self, from: &str, to: &str) -> Result<(), IndexingError> {
        let items = self.get_list(from).await?;
        self.put_list(to, &items).await?;
        self.delete_objs(&[from]).await
    }

    // State record lifecycle.

    /// Load the role's state record, or a fresh uninitialized one.
    pub async fn load_state(&self) -> Result<CycleState, IndexingError> {
        match self.get_obj(&self.state_key()).await? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Ok(CycleState::new(&self.title)),
        }
    }

    pub async fn save_state(&self, state: &CycleState) -> Result<(), IndexingError> {
        self.put_obj(&self.state_key(), serde_json::to_value(state)?)
            .await
    }

    /// Persist the opening of a cycle: previous-cycle bookkeeping is
    /// cleared, the batch lands in the todo set, and the transitioned
    /// record is saved before any entity is touched.
    pub async fn begin_cycle(
        &self,
        state: CycleState,
        batch: &[Uuid],
    ) -> Result<CycleState, IndexingError> {
        self.delete_objs(&[&self.files_added_key(), &self.files_dropped_key(), &self.last_key()])
            .await?;
        let ids: Vec<String> = batch.iter().map(Uuid::to_string).collect();
        self.put_list(&self.todo_key(), &ids).await?;

        let state = start_cycle(state, Utc::now());
        self.save_state(&state).await?;
        debug!(title = %self.title, batch = batch.len(), "cycle started");
        Ok(state)
    }

    /// Persist the closing of a cycle: todo renames into last, added and
    /// dropped counts are read back, this-cycle keys are deleted, and the
    /// transitioned record is saved.
    pub async fn close_cycle(
        &self,
        state: CycleState,
        errors: Vec<String>,
        cursor: Option<u64>,
    ) -> Result<(CycleState, usize, usize), IndexingError> {
        let added = self.list_count(&self.files_added_key()).await? as usize;
        let dropped = self.list_count(&self.files_dropped_key()).await? as usize;

        self.rename_list(&self.todo_key(), &self.last_key()).await?;

        let state = finish_cycle(state, added, dropped, errors, cursor, Utc::now());
        self.save_state(&state).await?;
        debug!(title = %self.title, added, dropped, "cycle finished");
        Ok((state, added, dropped))
    }

    /// Identifiers left in the todo set by an interrupted cycle.
    pub async fn todo_uuids(&self) -> Result<Vec<Uuid>, IndexingError> {
        Ok(self
            .get_list(&self.todo_key())
            .await?
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect())
    }

    /// Identifiers processed by the last completed cycle.
    pub async fn last_uuids(&self) -> Result<Vec<Uuid>, IndexingError> {
        Ok(self
            .get_list(&self.last_key())
            .await?
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect())
    }

    // Per-file accounting during a cycle.

    pub async fn file_added(&self, uuid: Uuid) -> Result<(), IndexingError> {
        self.list_extend(&self.files_added_key(), &[uuid.to_string()])
            .await
    }

    pub async fn file_dropped(&self, uuid: Uuid) -> Result<(), IndexingError> {
        self.list_extend(&self.files_dropped_key(), &[uuid.to_string()])
            .await
    }

    pub async fn files_added_count(&self) -> Result<u64, IndexingError> {
        self.list_count(&self.files_added_key()).await
    }

    pub async fn files_dropped_count(&self) -> Result<u64, IndexingError> {
        self.list_count(&self.files_dropped_key()).await
    }

    // Override, forced set, and the staged hand-off list.

    /// Request a full reindex on the next cycle.
    pub async fn request_reindex(&self) -> Result<(), IndexingError> {
        self.put_obj(&self.override_key(), json!({ "requested": true }))
            .await
    }

    /// Read and clear the reindex override flag.
    pub async fn take_reindex_request(&self) -> Result<bool, IndexingError> {
        let requested = self.get_obj(&self.override_key()).await?.is_some();
        if requested {
            self.delete_objs(&[&self.override_key()]).await?;
        }
        Ok(requested)
    }

    /// Queue specific datasets for a forced reindex.
    pub async fn force_uuids(&self, uuids: &[Uuid]) -> Result<(), IndexingError> {
        let ids: Vec<String> = uuids.iter().map(Uuid::to_string).collect();
        self.list_extend(&self.force_key(), &ids).await
    }

    /// Read and clear the forced set.
    pub async fn take_force_uuids(&self) -> Result<Vec<Uuid>, IndexingError> {
        let ids = self.get_list(&self.force_key()).await?;
        if !ids.is_empty() {
            self.delete_objs(&[&self.force_key()]).await?;
        }
        Ok(ids.iter().filter_map(|id| id.parse().ok()).collect())
    }

    pub async fn force_count(&self) -> Result<u64, IndexingError> {
        self.list_count(&self.force_key()).await
    }

    /// Append identifiers (and optionally a cursor marker) to the
    /// hand-off list. This is the primary indexer's side of the contract.
    pub async fn stage_for_handoff(
        &self,
        uuids: &[Uuid],
        cursor: Option<u64>,
    ) -> Result<(), IndexingError> {
        let mut items: Vec<String> = Vec::with_capacity(uuids.len() + 1);
        if let Some(xmin) = cursor {
            items.push(format!("xmin:{xmin}"));
        }
        items.extend(uuids.iter().map(Uuid::to_string));
        self.list_extend(&self.staged_key(), &items).await
    }

    /// Drain the hand-off list: read, then delete.
    ///
    /// Read-then-delete is not atomic. An id staged between the two steps
    /// is lost; the hand-off is at-most-once by design and the gap is a
    /// known limitation of the contract.
    pub async fn take_staged(&self) -> Result<Vec<String>, IndexingError> {
        let items = self.get_list(&self.staged_key()).await?;
        if !items.is_empty() {
            self.delete_objs(&[&self.staged_key()]).await?;
        }
        Ok(items)
    }

    pub async fn staged_count(&self) -> Result<u64, IndexingError> {
        self.list_count(&self.staged_key()).await
    }

    // Primary indexer markers, read-only from this role.

    /// Whether the primary indexer has ever completed a pass.
    pub async fn primary_initialized(&self) -> Result<bool, IndexingError> {
        Ok(self.get_obj("indexing").await?.is_some())
    }

    /// The primary indexer's in-flight cycle count, when recorded.
    pub async fn primary_cycle_count(&self) -> Result<Option<u64>, IndexingError> {
        Ok(self
            .get_obj("primary_indexer")
            .await?
            .and_then(|doc| doc.get("cycle_count").and_then(Value::as_u64)))
    }

    /// Mark the primary indexer as initialized. Test and self-contained
    /// deployments call this in place of a real primary pass.
    pub async fn mark_primary_initialized(&self) -> Result<(), IndexingError> {
        self.put_obj("indexing", json!({ "started": Utc::now().to_rfc3339() }))
            .await
    }
}
