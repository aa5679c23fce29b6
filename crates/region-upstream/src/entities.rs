//! Entity snapshot source backed by the primary document index.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use region_search::SearchEngine;
use region_types::{EntitySnapshot, INDEXABLE_TYPE};

use crate::error::UpstreamError;

/// Read-only view of the upstream entity universe.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Fetch an entity snapshot by id; `None` when the entity is unknown.
    async fn entity(&self, uuid: Uuid) -> Result<Option<EntitySnapshot>, UpstreamError>;

    /// Ids of released entities of the indexable root type, restricted to
    /// the given assay classifications.
    async fn eligible_entities(&self, assays: &[&str]) -> Result<Vec<Uuid>, UpstreamError>;

    /// The full universe of entities of the indexable root type,
    /// regardless of status. Liveness fallback for reindex resolution.
    async fn all_entities(&self) -> Result<Vec<Uuid>, UpstreamError>;
}

/// The production source: the primary document store is itself a search
/// index holding embedded entity snapshots.
pub struct SearchEntitySource {
    engine: Arc<dyn SearchEngine>,
    index: String,
    doctype: String,
}

impl SearchEntitySource {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        index: impl Into<String>,
        doctype: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            index: index.into(),
            doctype: doctype.into(),
        }
    }

    /// Scan query over publicly visible entities of the root type, with
    /// optional status and assay restrictions.
    fn scan_query(assays: &[&str], released_only: bool) -> Value {
        let mut filters = vec![
            json!({"terms": {"principals_allowed.view": ["system.Everyone"]}}),
            json!({"terms": {"embedded.@type.raw": [INDEXABLE_TYPE]}}),
        ];
        if released_only {
            filters.push(json!({"terms": {"embedded.status.raw": ["released"]}}));
        }
        if !assays.is_empty() {
            filters.push(json!({"terms": {"embedded.assay_term_name.raw": assays}}));
        }
        json!({
            "filter": {"and": {"filters": filters}},
            "query": {"match_all": {}},
            "_source": ["uuid"]
        })
    }

    async fn scan_uuids(&self, query: Value) -> Result<Vec<Uuid>, UpstreamError> {
        // Writes the primary indexer just made must be visible here.
        self.engine.refresh(&self.index).await?;
        let ids = self.engine.scan_ids(&self.index, query).await?;
        // Non-uuid ids cannot belong to entities; drop them quietly.
        Ok(ids.iter().filter_map(|id| id.parse().ok()).collect())
    }
}

#[async_trait]
impl EntitySource for SearchEntitySource {
    async fn entity(&self, uuid: Uuid) -> Result<Option<EntitySnapshot>, UpstreamError> {
        let doc = self
            .engine
            .get_doc(&self.index, &self.doctype, &uuid.to_string())
            .await?;
        let Some(doc) = doc else {
            return Ok(None);
        };
        let embedded = doc
            .get("embedded")
            .cloned()
            .ok_or_else(|| UpstreamError::Malformed(format!("{uuid}: no embedded snapshot")))?;
        let snapshot: EntitySnapshot = serde_json::from_value(embedded)?;
        Ok(Some(snapshot))
    }

    async fn eligible_entities(&self, assays: &[&str]) -> Result<Vec<Uuid>, UpstreamError> {
        let uuids = self.scan_uuids(Self::scan_query(assays, true)).await?;
        debug!(count = uuids.len(), "scanned eligible entities");
        Ok(uuids)
    }

    async fn all_entities(&self) -> Result<Vec<Uuid>, UpstreamError> {
        let uuids = self.scan_uuids(Self::scan_query(&[], false)).await?;
        debug!(count = uuids.len(), "scanned full entity universe");
        Ok(uuids)
    }
}
