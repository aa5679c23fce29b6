//! Region projector: parsed intervals in, index mutations out.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use region_search::{
    ensure_schema, expression_mapping, index_settings, region_mapping, residency_mapping,
    SearchEngine, SearchError, RESIDENT_DATASETS_INDEX, RESIDENT_DOCTYPE,
};
use region_types::{ExpressionDocument, ExpressionRow, Interval, RegionDocument, ResidencyRecord};

use crate::error::IndexingError;

/// Writes and deletes per-chromosome documents plus the residency record
/// that tracks them.
///
/// Indices and mappings are created lazily before the first write; the
/// check-then-create is safe only under the single-worker assumption.
pub struct RegionProjector {
    engine: Arc<dyn SearchEngine>,
}

impl RegionProjector {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Upsert one document per chromosome, then the residency record.
    ///
    /// Idempotent: identical input writes identical documents under
    /// identical ids.
    pub async fn project(
        &self,
        uuid: Uuid,
        assembly: &str,
        regions: &BTreeMap<String, Vec<Interval>>,
    ) -> Result<(), IndexingError> {
        for (chrom, positions) in regions {
            let doc = RegionDocument {
                uuid,
                positions: positions.clone(),
            };
            self.write_doc(chrom, assembly, region_mapping(assembly), uuid, &doc)
                .await?;
        }
        self.write_residency(uuid, assembly, regions.keys().cloned().collect())
            .await?;
        debug!(%uuid, assembly, chroms = regions.len(), "projected regions");
        Ok(())
    }

    /// Upsert a quantification document under the annotation-named index,
    /// tracked by the same residency bookkeeping as positional documents.
    pub async fn project_expression(
        &self,
        uuid: Uuid,
        assembly: &str,
        annotation: &str,
        rows: Vec<ExpressionRow>,
    ) -> Result<(), IndexingError> {
        let doc = ExpressionDocument {
            uuid,
            expression: rows,
        };
        self.write_doc(annotation, assembly, expression_mapping(assembly), uuid, &doc)
            .await?;
        self.write_residency(uuid, assembly, vec![annotation.to_string()])
            .await?;
        debug!(%uuid, assembly, annotation, "projected expression");
        Ok(())
    }

    /// Remove every trace of an id from the region index.
    ///
    /// Driven entirely by the residency record: absent record means
    /// nothing to do (`Ok(false)`). The record is deleted last, and only
    /// after every listed document delete succeeded, so a failure leaves
    /// it intact for the next cycle to retry the full removal.
    pub async fn remove(&self, uuid: Uuid) -> Result<bool, IndexingError> {
        let Some(record) = self.residency(uuid).await? else {
            return Ok(false);
        };

        for chrom in &record.chroms {
            match self
                .engine
                .delete_doc(chrom, &record.assembly, &record.uuid.to_string())
                .await
            {
                Ok(()) => {}
                // A document a prior partial removal already deleted;
                // continuing is what makes the retry converge.
                Err(SearchError::NotFound { .. }) => {
                    debug!(%uuid, chrom, "region document already absent");
                }
                Err(e) => {
                    warn!(%uuid, chrom, error = %e, "removal aborted, residency kept for retry");
                    return Err(e.into());
                }
            }
        }

        self.engine
            .delete_doc(RESIDENT_DATASETS_INDEX, RESIDENT_DOCTYPE, &uuid.to_string())
            .await?;
        debug!(%uuid, "removed from region index");
        Ok(true)
    }

    /// Whether an id currently has region documents.
    pub async fn is_resident(&self, uuid: Uuid) -> Result<bool, IndexingError> {
        Ok(self.residency(uuid).await?.is_some())
    }

    async fn residency(&self, uuid: Uuid) -> Result<Option<ResidencyRecord>, IndexingError> {
        let doc = self
            .engine
            .get_doc(RESIDENT_DATASETS_INDEX, RESIDENT_DOCTYPE, &uuid.to_string())
            .await?;
        match doc {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    async fn write_doc<T: serde::Serialize>(
        &self,
        index: &str,
        doctype: &str,
        mapping: Value,
        id: Uuid,
        doc: &T,
    ) -> Result<(), IndexingError> {
        ensure_schema(self.engine.as_ref(), index, doctype, index_settings(), mapping).await?;
        self.engine
            .put_doc(index, doctype, &id.to_string(), serde_json::to_value(doc)?)
            .await?;
        Ok(())
    }

    async fn write_residency(
        &self,
        uuid: Uuid,
        assembly: &str,
        chroms: Vec<String>,
    ) -> Result<(), IndexingError> {
        let record = ResidencyRecord {
            uuid,
            assembly: assembly.to_string(),
            chroms,
        };
        ensure_schema(
            self.engine.as_ref(),
            RESIDENT_DATASETS_INDEX,
            RESIDENT_DOCTYPE,
            index_settings(),
            residency_mapping(),
        )
        .await?;
        self.engine
            .put_doc(
                RESIDENT_DATASETS_INDEX,
                RESIDENT_DOCTYPE,
                &uuid.to_string(),
                serde_json::to_value(&record)?,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_search::MemoryEngine;

    fn regions() -> BTreeMap<String, Vec<Interval>> {
        let mut map = BTreeMap::new();
        map.insert(
            "chr1".to_string(),
            vec![Interval { start: 11, end: 21 }, Interval { start: 31, end: 41 }],
        );
        map.insert("chrx".to_string(), vec![Interval { start: 6, end: 9 }]);
        map
    }

    fn projector() -> (Arc<MemoryEngine>, RegionProjector) {
        let engine = Arc::new(MemoryEngine::new());
        let projector = RegionProjector::new(engine.clone());
        (engine, projector)
    }

    #[tokio::test]
    async fn test_project_writes_documents_and_residency() {
        let (engine, projector) = projector();
        let uuid = Uuid::new_v4();

        projector.project(uuid, "hg19", &regions()).await.unwrap();

        let chr1 = engine
            .get_doc("chr1", "hg19", &uuid.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chr1["positions"][0]["start"], 11);
        assert_eq!(chr1["positions"][1]["end"], 41);

        let chrx = engine
            .get_doc("chrx", "hg19", &uuid.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chrx["positions"][0]["start"], 6);

        let residency = engine
            .get_doc(RESIDENT_DATASETS_INDEX, RESIDENT_DOCTYPE, &uuid.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(residency["assembly"], "hg19");
        assert_eq!(residency["chroms"], serde_json::json!(["chr1", "chrx"]));

        // mappings were installed lazily
        assert!(engine.mapping_exists("chr1", "hg19").await.unwrap());
        assert!(engine
            .mapping_exists(RESIDENT_DATASETS_INDEX, RESIDENT_DOCTYPE)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_project_twice_is_idempotent() {
        let (engine, projector) = projector();
        let uuid = Uuid::new_v4();

        projector.project(uuid, "hg19", &regions()).await.unwrap();
        let first = engine.get_doc("chr1", "hg19", &uuid.to_string()).await.unwrap();
        let first_count = engine.count("chr1").await.unwrap();

        projector.project(uuid, "hg19", &regions()).await.unwrap();
        let second = engine.get_doc("chr1", "hg19", &uuid.to_string()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.count("chr1").await.unwrap(), first_count);
    }

    #[tokio::test]
    async fn test_remove_deletes_documents_then_record() {
        let (engine, projector) = projector();
        let uuid = Uuid::new_v4();
        projector.project(uuid, "hg19", &regions()).await.unwrap();

        assert!(projector.remove(uuid).await.unwrap());

        assert!(engine.get_doc("chr1", "hg19", &uuid.to_string()).await.unwrap().is_none());
        assert!(engine.get_doc("chrx", "hg19", &uuid.to_string()).await.unwrap().is_none());
        assert!(!projector.is_resident(uuid).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let (_engine, projector) = projector();
        assert!(!projector.remove(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_tolerates_already_deleted_document() {
        let (engine, projector) = projector();
        let uuid = Uuid::new_v4();
        projector.project(uuid, "hg19", &regions()).await.unwrap();

        // Simulate a prior partial removal: chr1 doc gone, record intact.
        engine.delete_doc("chr1", "hg19", &uuid.to_string()).await.unwrap();

        assert!(projector.remove(uuid).await.unwrap());
        assert!(!projector.is_resident(uuid).await.unwrap());
    }

    #[tokio::test]
    async fn test_project_expression_writes_under_annotation() {
        let (engine, projector) = projector();
        let uuid = Uuid::new_v4();
        let rows = vec![ExpressionRow {
            transcript_id: "ENST01".to_string(),
            gene_id: "ENSG01".to_string(),
            tpm: 1.5,
            fpkm: 0.0,
        }];

        projector
            .project_expression(uuid, "GRCh38", "v24", rows)
            .await
            .unwrap();

        let doc = engine
            .get_doc("v24", "GRCh38", &uuid.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["expression"][0]["gene_id"], "ENSG01");
        assert!(projector.is_resident(uuid).await.unwrap());

        // removal cleans expression documents through the same record
        assert!(projector.remove(uuid).await.unwrap());
        assert!(engine.get_doc("v24", "GRCh38", &uuid.to_string()).await.unwrap().is_none());
    }
}
