//! In-process search engine for tests and self-contained runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::{SearchEngine, SEARCH_MAX};
use crate::error::SearchError;

#[derive(Default)]
struct MemoryIndex {
    #[allow(dead_code)]
    settings: Value,
    mappings: HashMap<String, Value>,
    /// doctype -> id -> document body
    docs: HashMap<String, HashMap<String, Value>>,
}

/// Hash-map-backed engine. Documents and mappings live in process memory;
/// nothing survives a restart.
///
/// The scan implementation understands the filtered-terms query shape the
/// pipeline issues (`filter.and.filters[].terms`), matching field paths
/// against document JSON with a trailing `.raw` segment ignored.
#[derive(Default)]
pub struct MemoryEngine {
    indices: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    async fn get_doc(
        &self,
        index: &str,
        doctype: &str,
        id: &str,
    ) -> Result<Option<Value>, SearchError> {
        let indices = self.indices.read().expect("engine lock poisoned");
        Ok(indices
            .get(index)
            .and_then(|ix| ix.docs.get(doctype))
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put_doc(
        &self,
        index: &str,
        doctype: &str,
        id: &str,
        body: Value,
    ) -> Result<(), SearchError> {
        let mut indices = self.indices.write().expect("engine lock poisoned");
        // Writing to an absent index creates it, matching server behavior.
        indices
            .entry(index.to_string())
            .or_default()
            .docs
            .entry(doctype.to_string())
            .or_default()
            .insert(id.to_string(), body);
        Ok(())
    }

    async fn delete_doc(&self, index: &str, doctype: &str, id: &str) -> Result<(), SearchError> {
        let mut indices = self.indices.write().expect("engine lock poisoned");
        let removed = indices
            .get_mut(index)
            .and_then(|ix| ix.docs.get_mut(doctype))
            .and_then(|docs| docs.remove(id));
        match removed {
            Some(_) => Ok(()),
            None => Err(SearchError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let indices = self.indices.read().expect("engine lock poisoned");
        Ok(indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, settings: Value) -> Result<(), SearchError> {
        let mut indices = self.indices.write().expect("engine lock poisoned");
        indices.entry(index.to_string()).or_insert(MemoryIndex {
            settings,
            ..MemoryIndex::default()
        });
        Ok(())
    }

    async fn mapping_exists(&self, index: &str, doctype: &str) -> Result<bool, SearchError> {
        let indices = self.indices.read().expect("engine lock poisoned");
        Ok(indices
            .get(index)
            .map(|ix| ix.mappings.contains_key(doctype))
            .unwrap_or(false))
    }

    async fn put_mapping(
        &self,
        index: &str,
        doctype: &str,
        mapping: Value,
    ) -> Result<(), SearchError> {
        let mut indices = self.indices.write().expect("engine lock poisoned");
        indices
            .entry(index.to_string())
            .or_default()
            .mappings
            .insert(doctype.to_string(), mapping);
        Ok(())
    }

    async fn scan_ids(&self, index: &str, query: Value) -> Result<Vec<String>, SearchError> {
        let indices = self.indices.read().expect("engine lock poisoned");
        let Some(ix) = indices.get(index) else {
            return Ok(Vec::new());
        };

        let mut ids: Vec<String> = ix
            .docs
            .values()
            .flat_map(|docs| docs.iter())
            .filter(|(_, doc)| matches_query(doc, &query))
            .map(|(id, _)| id.clone())
            .take(SEARCH_MAX as usize)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn count(&self, index: &str) -> Result<u64, SearchError> {
        let indices = self.indices.read().expect("engine lock poisoned");
        Ok(indices
            .get(index)
            .map(|ix| ix.docs.values().map(|d| d.len() as u64).sum())
            .unwrap_or(0))
    }

    async fn refresh(&self, _index: &str) -> Result<(), SearchError> {
        // Writes are visible immediately; nothing to flush.
        Ok(())
    }
}

/// Evaluate the filtered-terms query shape against a document.
fn matches_query(doc: &Value, query: &Value) -> bool {
    match query.pointer("/filter/and/filters").and_then(Value::as_array) {
        None => true,
        Some(filters) => filters.iter().all(|f| matches_terms(doc, f)),
    }
}

fn matches_terms(doc: &Value, filter: &Value) -> bool {
    let Some(terms) = filter.get("terms").and_then(Value::as_object) else {
        return true;
    };
    terms.iter().all(|(field, allowed)| {
        let Some(allowed) = allowed.as_array() else {
            return false;
        };
        match lookup_field(doc, field) {
            Some(Value::Array(members)) => members.iter().any(|m| allowed.contains(m)),
            Some(value) => allowed.contains(value),
            None => false,
        }
    })
}

/// Navigate a dotted field path; a trailing `raw` segment is the
/// server-side keyword sub-field and is ignored here.
fn lookup_field<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    let segments: Vec<&str> = path.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        if *segment == "raw" && i == segments.len() - 1 {
            break;
        }
        current = current.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_delete_roundtrip() {
        let engine = MemoryEngine::new();
        engine
            .put_doc("chr1", "hg19", "id-1", json!({"uuid": "id-1"}))
            .await
            .unwrap();

        let doc = engine.get_doc("chr1", "hg19", "id-1").await.unwrap();
        assert_eq!(doc.unwrap()["uuid"], "id-1");

        engine.delete_doc("chr1", "hg19", "id-1").await.unwrap();
        assert!(engine.get_doc("chr1", "hg19", "id-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let engine = MemoryEngine::new();
        let err = engine.delete_doc("chr1", "hg19", "nope").await.unwrap_err();
        assert!(matches!(err, SearchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_index_and_mapping_lifecycle() {
        let engine = MemoryEngine::new();
        assert!(!engine.index_exists("chr1").await.unwrap());

        engine
            .create_index("chr1", json!({"index": {"number_of_shards": 1}}))
            .await
            .unwrap();
        assert!(engine.index_exists("chr1").await.unwrap());
        assert!(!engine.mapping_exists("chr1", "hg19").await.unwrap());

        engine
            .put_mapping("chr1", "hg19", json!({"hg19": {}}))
            .await
            .unwrap();
        assert!(engine.mapping_exists("chr1", "hg19").await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_is_a_noop() {
        let engine = MemoryEngine::new();
        engine.refresh("absent").await.unwrap();
        engine.put_doc("idx", "doc", "1", json!({})).await.unwrap();
        engine.refresh("idx").await.unwrap();
        assert_eq!(engine.count("idx").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_count_spans_doctypes() {
        let engine = MemoryEngine::new();
        engine.put_doc("idx", "a", "1", json!({})).await.unwrap();
        engine.put_doc("idx", "b", "2", json!({})).await.unwrap();
        assert_eq!(engine.count("idx").await.unwrap(), 2);
        assert_eq!(engine.count("absent").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_scan_with_terms_filter() {
        let engine = MemoryEngine::new();
        engine
            .put_doc(
                "primary",
                "doc",
                "a",
                json!({"embedded": {"@type": ["Experiment"], "status": "released"}}),
            )
            .await
            .unwrap();
        engine
            .put_doc(
                "primary",
                "doc",
                "b",
                json!({"embedded": {"@type": ["Experiment"], "status": "archived"}}),
            )
            .await
            .unwrap();
        engine
            .put_doc(
                "primary",
                "doc",
                "c",
                json!({"embedded": {"@type": ["Lab"], "status": "released"}}),
            )
            .await
            .unwrap();

        let query = json!({
            "filter": {"and": {"filters": [
                {"terms": {"embedded.@type.raw": ["Experiment"]}},
                {"terms": {"embedded.status.raw": ["released"]}}
            ]}},
            "query": {"match_all": {}},
            "_source": ["uuid"]
        });

        let ids = engine.scan_ids("primary", query).await.unwrap();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_scan_match_all_on_missing_filter() {
        let engine = MemoryEngine::new();
        engine.put_doc("idx", "doc", "x", json!({})).await.unwrap();
        let ids = engine
            .scan_ids("idx", json!({"query": {"match_all": {}}}))
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
    }
}
