//! Read-only snapshots of upstream entities.
//!
//! Entities are owned by the primary document store; this pipeline only
//! consumes embedded snapshots of them. Unknown fields in the source
//! documents are ignored on deserialization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root type tag an entity must carry to be indexable at all.
pub const INDEXABLE_TYPE: &str = "Experiment";

/// Snapshot of an upstream dataset/experiment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Stable opaque identifier
    pub uuid: Uuid,
    /// Type tags, e.g. `["Experiment", "Dataset", "Item"]`
    #[serde(rename = "@type", default)]
    pub type_tags: Vec<String>,
    /// Release status
    #[serde(default)]
    pub status: Option<String>,
    /// Assay classification, e.g. "ChIP-seq"
    #[serde(default)]
    pub assay_term_name: Option<String>,
    /// Human-facing accession, used only for logging
    #[serde(default)]
    pub accession: Option<String>,
    /// Associated file descriptors
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

/// Snapshot of a file attached to an entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// The file's own identifier
    pub uuid: Uuid,
    /// Release status
    #[serde(default)]
    pub status: Option<String>,
    /// Download path, relative to the upstream host
    #[serde(default)]
    pub href: Option<String>,
    /// Assembly the coordinates refer to (pre-normalization)
    #[serde(default)]
    pub assembly: Option<String>,
    /// Container format, e.g. "bed" or "tsv"
    #[serde(default)]
    pub file_format: Option<String>,
    /// Pipeline output classification
    #[serde(default)]
    pub output_type: Option<String>,
    /// Finer-grained file type, e.g. "bed narrowPeak"
    #[serde(default)]
    pub file_type: Option<String>,
    /// Genome annotation release, keys quantification documents
    #[serde(default)]
    pub genome_annotation: Option<String>,
}

impl FileDescriptor {
    /// Look up a requirement property by name.
    ///
    /// Requirement dictionaries are keyed by upstream property names; this
    /// maps them onto the snapshot fields.
    pub fn property(&self, name: &str) -> Option<&str> {
        match name {
            "file_format" => self.file_format.as_deref(),
            "output_type" => self.output_type.as_deref(),
            "file_type" => self.file_type.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_snapshot_from_upstream_json() {
        let json = r#"{
            "uuid": "e4cbbe29-0e93-4dca-9e26-1bf7e1ba50be",
            "@type": ["Experiment", "Dataset", "Item"],
            "status": "released",
            "assay_term_name": "DNase-seq",
            "accession": "ENCSR000EMT",
            "unknown_field": 42,
            "files": [{
                "uuid": "6537ee7a-b019-4d0f-8157-9bb45c4f1cc2",
                "status": "released",
                "href": "/files/ENCFF002COS/@@download/ENCFF002COS.bed.gz",
                "assembly": "hg19",
                "file_format": "bed",
                "file_type": "bed narrowPeak"
            }]
        }"#;
        let snap: EntitySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.type_tags[0], "Experiment");
        assert_eq!(snap.assay_term_name.as_deref(), Some("DNase-seq"));
        assert_eq!(snap.files.len(), 1);
        assert_eq!(snap.files[0].property("file_format"), Some("bed"));
        assert_eq!(snap.files[0].property("file_type"), Some("bed narrowPeak"));
        assert_eq!(snap.files[0].property("output_type"), None);
    }

    #[test]
    fn test_file_descriptor_unknown_property() {
        let file = FileDescriptor::default();
        assert_eq!(file.property("lab"), None);
    }
}
