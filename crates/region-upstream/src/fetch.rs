//! Raw file content fetching.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::error::UpstreamError;

/// A fetched file body with its HTTP-style status.
///
/// Non-200 statuses are data, not errors: the pipeline treats an
/// unavailable file as "skip this item", never as a cycle failure.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub status: u16,
    pub body: Bytes,
}

impl FetchedFile {
    /// Whether the body is usable.
    pub fn available(&self) -> bool {
        self.status == 200
    }
}

/// Fetch raw file content by href.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, href: &str) -> Result<FetchedFile, UpstreamError>;
}

/// HTTP fetcher resolving host-relative hrefs against a base URL.
pub struct HttpFileFetcher {
    client: Client,
    base_url: String,
}

impl HttpFileFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn resolve(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}/{}", self.base_url, href.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, href: &str) -> Result<FetchedFile, UpstreamError> {
        let url = self.resolve(href);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        debug!(url, status, bytes = body.len(), "fetched file");
        Ok(FetchedFile { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_is_strict_200() {
        let ok = FetchedFile {
            status: 200,
            body: Bytes::from_static(b"x"),
        };
        let missing = FetchedFile {
            status: 404,
            body: Bytes::new(),
        };
        assert!(ok.available());
        assert!(!missing.available());
    }

    #[test]
    fn test_resolve_relative_and_absolute_hrefs() {
        let fetcher = HttpFileFetcher::new("https://upstream.example.org/").unwrap();
        assert_eq!(
            fetcher.resolve("/files/ENCFF002COS/@@download/f.bed.gz"),
            "https://upstream.example.org/files/ENCFF002COS/@@download/f.bed.gz"
        );
        assert_eq!(
            fetcher.resolve("https://elsewhere.org/f.bed"),
            "https://elsewhere.org/f.bed"
        );
    }
}
