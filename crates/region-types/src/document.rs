//! Persisted document shapes for the region search index.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interval::{ExpressionRow, Interval};

/// Per-chromosome document: one per (chromosome index, assembly doctype,
/// entity id). Created or overwritten on add, deleted on drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDocument {
    /// Entity the positions belong to
    pub uuid: Uuid,
    /// Intervals on this chromosome, in source order
    pub positions: Vec<Interval>,
}

/// Per-annotation quantification document: one per (annotation index,
/// assembly doctype, file id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionDocument {
    /// File the rows were parsed from
    pub uuid: Uuid,
    /// Quantification rows with TPM or FPKM above zero
    pub expression: Vec<ExpressionRow>,
}

/// Residency record: the single source of truth for which chromosome
/// indices hold documents for an entity.
///
/// Invariant: if a record exists for id X, exactly the listed chroms
/// contain a region document for X. Removal consults this record and
/// nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidencyRecord {
    /// Entity id the record belongs to
    pub uuid: Uuid,
    /// Normalized assembly the documents were written under
    pub assembly: String,
    /// Chromosome indices currently holding a document for this entity
    pub chroms: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_document_json_shape() {
        let doc = RegionDocument {
            uuid: Uuid::nil(),
            positions: vec![Interval { start: 11, end: 21 }],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["positions"][0]["start"], 11);
        assert_eq!(json["positions"][0]["end"], 21);
        assert!(json["uuid"].is_string());
    }

    #[test]
    fn test_residency_record_roundtrip() {
        let rec = ResidencyRecord {
            uuid: Uuid::new_v4(),
            assembly: "hg19".to_string(),
            chroms: vec!["chr1".to_string(), "chrx".to_string()],
        };
        let json = serde_json::to_string(&rec).unwrap();
        let decoded: ResidencyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, decoded);
    }
}
