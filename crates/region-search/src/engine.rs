//! The search-engine capability trait.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::SearchError;

/// Upper bound on hits pulled back by a single scan.
pub const SEARCH_MAX: u64 = 99_999;

/// Capability surface the pipeline needs from a search engine.
///
/// Documents are addressed by `(index, doctype, id)`. Bodies are plain
/// JSON values; schema enforcement is the engine's business.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Fetch a document source, `None` when absent.
    async fn get_doc(&self, index: &str, doctype: &str, id: &str)
        -> Result<Option<Value>, SearchError>;

    /// Create or overwrite a document.
    async fn put_doc(
        &self,
        index: &str,
        doctype: &str,
        id: &str,
        body: Value,
    ) -> Result<(), SearchError>;

    /// Delete a document. Deleting an absent document is
    /// [`SearchError::NotFound`].
    async fn delete_doc(&self, index: &str, doctype: &str, id: &str) -> Result<(), SearchError>;

    /// Whether the index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Create an index with the given settings body.
    async fn create_index(&self, index: &str, settings: Value) -> Result<(), SearchError>;

    /// Whether the index has a mapping for the doctype.
    async fn mapping_exists(&self, index: &str, doctype: &str) -> Result<bool, SearchError>;

    /// Install a mapping for the doctype.
    async fn put_mapping(
        &self,
        index: &str,
        doctype: &str,
        mapping: Value,
    ) -> Result<(), SearchError>;

    /// Bulk scan: ids of every document matching the query, up to
    /// [`SEARCH_MAX`].
    async fn scan_ids(&self, index: &str, query: Value) -> Result<Vec<String>, SearchError>;

    /// Number of documents in the index.
    async fn count(&self, index: &str) -> Result<u64, SearchError>;

    /// Make recent writes visible to scans and counts.
    async fn refresh(&self, index: &str) -> Result<(), SearchError>;
}

/// Create the index and doctype mapping if missing.
///
/// Check-then-create is not atomic: two workers racing here can both see
/// "missing" and one create will fail. The pipeline runs a single logical
/// worker per indexing role, which is what makes this safe.
pub async fn ensure_schema(
    engine: &dyn SearchEngine,
    index: &str,
    doctype: &str,
    settings: Value,
    mapping: Value,
) -> Result<(), SearchError> {
    if !engine.index_exists(index).await? {
        debug!(index, "creating index");
        engine.create_index(index, settings).await?;
    }
    if !engine.mapping_exists(index, doctype).await? {
        debug!(index, doctype, "installing mapping");
        engine.put_mapping(index, doctype, mapping).await?;
    }
    Ok(())
}
