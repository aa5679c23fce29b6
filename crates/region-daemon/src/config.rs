//! Daemon configuration.
//!
//! Loaded from a TOML file; every section has working defaults so a
//! missing file or empty section still yields a runnable config.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Which engine implementation talks to the indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// In-process engine; state dies with the process. Good for trying
    /// the pipeline end to end without a search server.
    Memory,
    /// Elasticsearch-style REST servers.
    Http,
}

/// Search engine endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: EngineMode,
    /// Target region index server
    pub regions_url: String,
    /// Primary document index server
    pub primary_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Http,
            regions_url: "http://localhost:9201".to_string(),
            primary_url: "http://localhost:9200".to_string(),
        }
    }
}

/// Upstream document store layout and file hosting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Primary index name holding embedded entity snapshots
    pub index: String,
    /// Doctype under the primary index
    pub doctype: String,
    /// Host that serves file downloads for relative hrefs
    pub file_host: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            index: "snovault".to_string(),
            doctype: "document".to_string(),
            file_host: "http://localhost:8000".to_string(),
        }
    }
}

/// Full daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub engine: EngineConfig,
    pub upstream: UpstreamConfig,
}

impl DaemonConfig {
    /// Load from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                let config: DaemonConfig = toml::from_str(&content)
                    .with_context(|| format!("failed to parse config file: {}", path.display()))?;
                Ok(config)
            }
            None => Ok(DaemonConfig::default()),
        }
    }
}
