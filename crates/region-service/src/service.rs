//! The region indexer's request-facing surface.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use region_indexing::{CycleOptions, RegionPipeline};
use region_search::{SearchEngine, RESIDENT_DATASETS_INDEX};
use region_types::{CycleReport, StateDisplay};

use crate::error::ServiceError;

/// Flags accepted by the trigger endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TriggerParams {
    /// Resolve and report only, mutate nothing
    pub dry_run: bool,
    /// Bypass the residency check
    pub force: bool,
    /// Resolve from the transaction log starting here
    pub last_cursor: Option<u64>,
}

/// Parameters accepted by the state endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateParams {
    /// `"all"` requests a full reindex on the next cycle
    pub reindex: Option<String>,
}

/// Bundles the pipeline and target engine behind the two endpoint
/// behaviors.
pub struct RegionIndexService {
    engine: Arc<dyn SearchEngine>,
    pipeline: RegionPipeline,
}

impl RegionIndexService {
    pub fn new(engine: Arc<dyn SearchEngine>, pipeline: RegionPipeline) -> Self {
        Self { engine, pipeline }
    }

    /// The pipeline, for hosts that drive cycles directly.
    pub fn pipeline(&self) -> &RegionPipeline {
        &self.pipeline
    }

    /// Trigger endpoint: run one cycle and report.
    ///
    /// A whole-cycle failure is caught here and reported in the body;
    /// the state store keeps its last committed record and the next
    /// invocation retries from there. Nothing in this path is fatal to
    /// the host.
    pub async fn index_regions(&self, params: TriggerParams) -> CycleReport {
        let opts = CycleOptions {
            dry_run: params.dry_run,
            force: params.force,
            last_cursor: params.last_cursor,
        };
        match self.pipeline.run_cycle(opts).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "cycle failed");
                let state = self.pipeline.state();
                let (status, cycles) = match state.load_state().await {
                    Ok(record) => (record.status, record.cycles),
                    Err(_) => (region_types::CycleStatus::Done, 0),
                };
                let mut report = CycleReport::empty(state.title(), status);
                report.cycles = cycles;
                report.errors.push(e.to_string());
                report
            }
        }
    }

    /// State endpoint: durable record plus counts derived live.
    pub async fn indexer_state(&self, params: StateParams) -> Result<StateDisplay, ServiceError> {
        let state = self.pipeline.state();

        if params.reindex.as_deref() == Some("all") {
            info!("full reindex requested");
            state.request_reindex().await?;
        }

        let record = state.load_state().await?;
        let force_count = state.force_count().await?;

        // The resident count is best-effort: an unreachable or not yet
        // created index reads as "not available", never as a failure.
        let files_in_index = self.engine.count(RESIDENT_DATASETS_INDEX).await.ok();

        Ok(StateDisplay {
            title: record.title,
            status: record.status,
            cursor: record.cursor,
            cycles: record.cycles,
            staged_to_process: state.staged_count().await?,
            files_added: state.files_added_count().await?,
            files_dropped: state.files_dropped_count().await?,
            datasets_to_force: (force_count > 0).then_some(force_count),
            files_in_index,
            errors: record.errors,
        })
    }

    /// Queue specific datasets for a forced reindex on the next cycle.
    pub async fn force_datasets(&self, uuids: &[Uuid]) -> Result<(), ServiceError> {
        info!(count = uuids.len(), "forced reindex requested for selected datasets");
        self.pipeline.state().force_uuids(uuids).await?;
        Ok(())
    }
}
