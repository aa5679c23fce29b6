//! Elasticsearch-style REST client.
//!
//! Speaks the minimal verb set the capability trait needs. One doctype
//! per assembly and per-index mapping installation follow the server's
//! REST conventions (`PUT /{index}`, `PUT /{index}/_mapping/{doctype}`,
//! `GET|PUT|DELETE /{index}/{doctype}/{id}`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::engine::{SearchEngine, SEARCH_MAX};
use crate::error::SearchError;

/// REST client for a remote search server.
pub struct HttpEngine {
    client: Client,
    base_url: String,
}

impl HttpEngine {
    /// Connect to a server base URL, e.g. `http://localhost:9200`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn unexpected(status: StatusCode, url: String) -> SearchError {
        SearchError::UnexpectedStatus {
            status: status.as_u16(),
            url,
        }
    }
}

#[async_trait]
impl SearchEngine for HttpEngine {
    async fn get_doc(
        &self,
        index: &str,
        doctype: &str,
        id: &str,
    ) -> Result<Option<Value>, SearchError> {
        let url = self.url(&format!("{index}/{doctype}/{id}"));
        let resp = self.client.get(&url).send().await?;
        match resp.status() {
            StatusCode::OK => {
                let body: Value = resp.json().await?;
                Ok(body.get("_source").cloned())
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(Self::unexpected(status, url)),
        }
    }

    async fn put_doc(
        &self,
        index: &str,
        doctype: &str,
        id: &str,
        body: Value,
    ) -> Result<(), SearchError> {
        let url = self.url(&format!("{index}/{doctype}/{id}"));
        let resp = self.client.put(&url).json(&body).send().await?;
        if resp.status().is_success() {
            debug!(index, doctype, id, "indexed document");
            Ok(())
        } else {
            Err(Self::unexpected(resp.status(), url))
        }
    }

    async fn delete_doc(&self, index: &str, doctype: &str, id: &str) -> Result<(), SearchError> {
        let url = self.url(&format!("{index}/{doctype}/{id}"));
        let resp = self.client.delete(&url).send().await?;
        match resp.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(SearchError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            }),
            status => Err(Self::unexpected(status, url)),
        }
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let url = self.url(index);
        let resp = self.client.head(&url).send().await?;
        match resp.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Self::unexpected(status, url)),
        }
    }

    async fn create_index(&self, index: &str, settings: Value) -> Result<(), SearchError> {
        let url = self.url(index);
        let resp = self.client.put(&url).json(&settings).send().await?;
        if resp.status().is_success() {
            debug!(index, "created index");
            Ok(())
        } else {
            Err(Self::unexpected(resp.status(), url))
        }
    }

    async fn mapping_exists(&self, index: &str, doctype: &str) -> Result<bool, SearchError> {
        let url = self.url(&format!("{index}/_mapping/{doctype}"));
        let resp = self.client.get(&url).send().await?;
        match resp.status() {
            StatusCode::OK => {
                // An empty object body means the doctype is unmapped.
                let body: Value = resp.json().await?;
                Ok(body.as_object().map(|o| !o.is_empty()).unwrap_or(false))
            }
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Self::unexpected(status, url)),
        }
    }

    async fn put_mapping(
        &self,
        index: &str,
        doctype: &str,
        mapping: Value,
    ) -> Result<(), SearchError> {
        let url = self.url(&format!("{index}/_mapping/{doctype}"));
        let resp = self.client.put(&url).json(&mapping).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::unexpected(resp.status(), url))
        }
    }

    async fn scan_ids(&self, index: &str, query: Value) -> Result<Vec<String>, SearchError> {
        let url = self.url(&format!("{index}/_search?size={SEARCH_MAX}"));
        let resp = self.client.post(&url).json(&query).send().await?;
        if !resp.status().is_success() {
            return Err(Self::unexpected(resp.status(), url));
        }
        let body: Value = resp.json().await?;
        let hits = body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(hits
            .iter()
            .filter_map(|hit| hit.get("_id").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    async fn count(&self, index: &str) -> Result<u64, SearchError> {
        let url = self.url(&format!("{index}/_count"));
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Self::unexpected(resp.status(), url));
        }
        let body: Value = resp.json().await?;
        Ok(body.get("count").and_then(Value::as_u64).unwrap_or(0))
    }

    async fn refresh(&self, index: &str) -> Result<(), SearchError> {
        let url = self.url(&format!("{index}/_refresh"));
        let resp = self.client.post(&url).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::unexpected(resp.status(), url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let engine = HttpEngine::new("http://localhost:9200/").unwrap();
        assert_eq!(engine.url("chr1/hg19/x"), "http://localhost:9200/chr1/hg19/x");
    }
}
