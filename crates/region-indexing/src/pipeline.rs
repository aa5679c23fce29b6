//! Cycle orchestrator: drives one full reconciliation cycle.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use region_parser::{decode_source, parse_peaks, parse_quantifications};
use region_search::SearchEngine;
use region_types::{
    normalize_assembly, supported_assembly, CycleReport, EntitySnapshot, FileDescriptor,
};
use region_upstream::{EntitySource, FileFetcher, TxnLog};

use crate::candidacy::{candidate_entity, candidate_file, ALLOWED_FILE_FORMATS};
use crate::error::IndexingError;
use crate::projector::RegionProjector;
use crate::resolver::{ChangeSet, ChangeSetResolver, CycleKind};
use crate::state::{CycleState, StateStore};

/// Per-invocation flags for a cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOptions {
    /// Resolve and report only; no index mutation of any kind
    pub dry_run: bool,
    /// Bypass the residency check, reprojecting files already resident
    pub force: bool,
    /// Resolve from the transaction log starting at this cursor instead
    /// of the staged hand-off list (requires a configured log)
    pub last_cursor: Option<u64>,
}

/// Top-level state machine for the region indexing role.
///
/// One invocation = one cycle: resolve the change set, drive the
/// projector over each entity, and close the cycle through the state
/// store. Entities are processed strictly one at a time; per-entity
/// failures are recorded and never abort the batch.
pub struct RegionPipeline {
    upstream: Arc<dyn EntitySource>,
    fetcher: Arc<dyn FileFetcher>,
    txn_log: Option<Arc<dyn TxnLog>>,
    projector: RegionProjector,
    state: StateStore,
}

impl RegionPipeline {
    /// Build a pipeline writing to `engine`. The cycle state lives in the
    /// same engine's meta index.
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        upstream: Arc<dyn EntitySource>,
        fetcher: Arc<dyn FileFetcher>,
    ) -> Self {
        Self {
            upstream,
            fetcher,
            txn_log: None,
            projector: RegionProjector::new(engine.clone()),
            state: StateStore::new(engine, "regions"),
        }
    }

    /// Attach a transaction log, enabling cursor-driven resolution.
    pub fn with_txn_log(mut self, log: Arc<dyn TxnLog>) -> Self {
        self.txn_log = Some(log);
        self
    }

    /// The pipeline's state store, shared with inspection surfaces.
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// The projector, shared with inspection surfaces.
    pub fn projector(&self) -> &RegionProjector {
        &self.projector
    }

    /// Run one cycle and report what happened.
    pub async fn run_cycle(&self, opts: CycleOptions) -> Result<CycleReport, IndexingError> {
        let state = self.state.load_state().await?;
        let last_cursor = opts.last_cursor.or(state.cursor);

        let resolver = ChangeSetResolver::new(&self.state, self.upstream.as_ref());
        let change = match (&self.txn_log, opts.last_cursor) {
            (Some(log), Some(_)) => {
                resolver.resolve_from_txn_log(log.as_ref(), last_cursor).await?
            }
            _ => resolver.resolve().await?,
        };

        match change.kind {
            CycleKind::Uninitialized => {
                debug!("primary indexer not caught up, nothing to do");
                let state = self.state.load_state().await?;
                return Ok(report_from_state(&state, &change, last_cursor));
            }
            CycleKind::Restart => {
                // Reprocessing a half-written batch risks duplicate side
                // effects; wait for an operator override instead.
                warn!(count = change.uuids.len(), "skipping restart of interrupted cycle");
                return Ok(report_from_state(&state, &change, last_cursor));
            }
            CycleKind::Reindex | CycleKind::Normal => {}
        }

        if change.uuids.is_empty() {
            let mut state = state;
            if change.cursor.is_some() {
                state.cursor = change.cursor;
                self.state.save_state(&state).await?;
            }
            return Ok(report_from_state(&state, &change, last_cursor));
        }

        if opts.dry_run {
            info!(count = change.uuids.len(), "dry run: batch resolved, mutation skipped");
            return Ok(report_from_state(&state, &change, last_cursor));
        }

        info!(count = change.uuids.len(), force = change.force || opts.force, "cycle started");
        let state = self.state.begin_cycle(state, &change.uuids).await?;
        let force = opts.force || change.force;

        let mut errors = Vec::new();
        for uuid in &change.uuids {
            if let Err(e) = self.update_entity(*uuid, force).await {
                warn!(%uuid, error = %e, "entity failed, continuing batch");
                errors.push(format!("{uuid}: {e}"));
            }
        }

        let (state, added, dropped) =
            self.state.close_cycle(state, errors, change.cursor).await?;
        info!(indexed = state.indexed, added, dropped, "cycle finished");

        Ok(CycleReport {
            title: state.title.clone(),
            status: state.status,
            cursor: state.cursor,
            last_cursor,
            txn_count: change.txn_count,
            indexed: state.indexed,
            added,
            dropped,
            cycles: state.cycles,
            cycle_took: state.cycle_took,
            errors: state.errors,
        })
    }

    /// Reconcile one entity: add eligible files not yet resident, drop
    /// resident files that stopped being eligible.
    async fn update_entity(&self, uuid: Uuid, force: bool) -> Result<(), IndexingError> {
        let Some(entity) = self.upstream.entity(uuid).await? else {
            // Purged or never an entity; not an error.
            debug!(%uuid, "entity not found upstream, skipping");
            return Ok(());
        };

        if !candidate_entity(&entity) {
            // Files of a former candidate stay put until their own
            // file-level eligibility flips; the drop branch below only
            // runs for entities still in scope.
            debug!(%uuid, "entity is not a candidate, skipping");
            return Ok(());
        }
        let Some(assay) = entity.assay_term_name.clone() else {
            return Ok(());
        };

        for file in &entity.files {
            let Some(format) = file.file_format.as_deref() else {
                continue;
            };
            if !ALLOWED_FILE_FORMATS.contains(&format) {
                continue;
            }

            if candidate_file(file, &assay) {
                if force {
                    // Drop any stale projection so the rewrite is clean.
                    self.projector.remove(file.uuid).await?;
                } else if self.projector.is_resident(file.uuid).await? {
                    continue;
                }
                if self.add_file(&entity, file, format).await? {
                    self.state.file_added(file.uuid).await?;
                    info!(
                        dataset = entity.accession.as_deref().unwrap_or("?"),
                        file = %file.uuid,
                        force,
                        "added file"
                    );
                }
            } else if self.projector.remove(file.uuid).await? {
                self.state.file_dropped(file.uuid).await?;
                info!(
                    dataset = entity.accession.as_deref().unwrap_or("?"),
                    file = %file.uuid,
                    "dropped file"
                );
            }
        }

        Ok(())
    }

    /// Fetch, parse, and project one file. `Ok(false)` means the file was
    /// skipped without touching the index.
    async fn add_file(
        &self,
        entity: &EntitySnapshot,
        file: &FileDescriptor,
        format: &str,
    ) -> Result<bool, IndexingError> {
        let Some(href) = file.href.as_deref() else {
            return Ok(false);
        };
        let Some(assembly) = file.assembly.as_deref() else {
            return Ok(false);
        };
        let assembly = normalize_assembly(assembly);
        if !supported_assembly(assembly) {
            return Ok(false);
        }

        let fetched = match self.fetcher.fetch(href).await {
            Ok(fetched) => fetched,
            Err(e) => {
                // Fetch trouble is transient; the file stays a candidate
                // for the next cycle.
                warn!(href, error = %e, "file fetch failed, skipping");
                return Ok(false);
            }
        };
        if !fetched.available() {
            warn!(
                href,
                status = fetched.status,
                dataset = entity.accession.as_deref().unwrap_or("?"),
                "file unavailable, skipping"
            );
            return Ok(false);
        }

        match format {
            "bed" => {
                let parse = parse_peaks(decode_source(&fetched.body))?;
                if parse.is_empty() {
                    return Ok(false);
                }
                self.projector
                    .project(file.uuid, assembly, &parse.regions)
                    .await?;
                Ok(true)
            }
            "tsv" => {
                let Some(annotation) = file.genome_annotation.as_deref() else {
                    return Ok(false);
                };
                let parse = parse_quantifications(decode_source(&fetched.body))?;
                if parse.rows.is_empty() {
                    return Ok(false);
                }
                self.projector
                    .project_expression(file.uuid, assembly, annotation, parse.rows)
                    .await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn report_from_state(state: &CycleState, change: &ChangeSet, last_cursor: Option<u64>) -> CycleReport {
    CycleReport {
        title: state.title.clone(),
        status: state.status,
        cursor: state.cursor.or(change.cursor),
        last_cursor,
        txn_count: change.txn_count,
        indexed: 0,
        added: 0,
        dropped: 0,
        cycles: state.cycles,
        cycle_took: state.cycle_took,
        errors: Vec::new(),
    }
}
