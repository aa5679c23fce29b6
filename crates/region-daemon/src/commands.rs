//! Command handlers: wire the configured engines into the service and
//! print JSON bodies to stdout.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use region_indexing::RegionPipeline;
use region_search::{HttpEngine, MemoryEngine, SearchEngine};
use region_service::{RegionIndexService, StateParams, TriggerParams};
use region_upstream::{HttpFileFetcher, SearchEntitySource};

use crate::config::{DaemonConfig, EngineMode};

/// Initialize tracing from the flag, falling back to `RUST_LOG` and then
/// to `info`.
pub fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(config: &DaemonConfig) -> Result<RegionIndexService> {
    let (regions, primary): (Arc<dyn SearchEngine>, Arc<dyn SearchEngine>) =
        match config.engine.mode {
            EngineMode::Memory => {
                let engine = Arc::new(MemoryEngine::new());
                (engine.clone(), engine)
            }
            EngineMode::Http => (
                Arc::new(HttpEngine::new(&config.engine.regions_url)?),
                Arc::new(HttpEngine::new(&config.engine.primary_url)?),
            ),
        };

    let upstream = Arc::new(SearchEntitySource::new(
        primary,
        &config.upstream.index,
        &config.upstream.doctype,
    ));
    let fetcher = Arc::new(HttpFileFetcher::new(&config.upstream.file_host)?);
    let pipeline = RegionPipeline::new(regions.clone(), upstream, fetcher);
    Ok(RegionIndexService::new(regions, pipeline))
}

fn print_json<T: serde::Serialize>(body: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}

/// Run one indexing cycle and print the report.
pub async fn handle_cycle(
    config: &DaemonConfig,
    dry_run: bool,
    force: bool,
    last_cursor: Option<u64>,
) -> Result<()> {
    let service = build_service(config)?;
    let report = service
        .index_regions(TriggerParams {
            dry_run,
            force,
            last_cursor,
        })
        .await;
    print_json(&report)
}

/// Print the state display, optionally requesting a full reindex.
pub async fn handle_state(config: &DaemonConfig, reindex: Option<String>) -> Result<()> {
    let service = build_service(config)?;
    let display = service.indexer_state(StateParams { reindex }).await?;
    print_json(&display)
}

/// Request a reindex of everything or of a selected set.
pub async fn handle_reindex(config: &DaemonConfig, uuids: Vec<Uuid>) -> Result<()> {
    let service = build_service(config)?;
    if uuids.is_empty() {
        service.pipeline().state().request_reindex().await?;
        info!("full reindex requested for the next cycle");
    } else {
        service.force_datasets(&uuids).await?;
        info!(count = uuids.len(), "forced reindex requested");
    }
    let display = service.indexer_state(StateParams::default()).await?;
    print_json(&display)
}

/// Append identifiers to the hand-off list.
pub async fn handle_stage(
    config: &DaemonConfig,
    uuids: Vec<Uuid>,
    cursor: Option<u64>,
) -> Result<()> {
    let service = build_service(config)?;
    service
        .pipeline()
        .state()
        .stage_for_handoff(&uuids, cursor)
        .await?;
    info!(count = uuids.len(), "staged for next cycle");
    let display = service.indexer_state(StateParams::default()).await?;
    print_json(&display)
}
