//! Eligibility predicates.
//!
//! Pure functions over snapshots: candidacy is decided once per
//! (entity, file) pair before any index mutation is attempted. No I/O
//! happens here.

use region_types::{supported_assembly, EntitySnapshot, FileDescriptor, INDEXABLE_TYPE};

/// Container formats the pipeline knows how to parse.
pub const ALLOWED_FILE_FORMATS: &[&str] = &["bed", "tsv"];

/// File statuses eligible for indexing.
pub const ALLOWED_STATUSES: &[&str] = &["released"];

const CHIP_SEQ: &[(&str, &[&str])] = &[
    ("output_type", &["optimal idr thresholded peaks"]),
    ("file_format", &["bed"]),
];

const DNASE_SEQ: &[(&str, &[&str])] = &[
    ("file_type", &["bed narrowPeak"]),
    ("file_format", &["bed"]),
];

const ECLIP: &[(&str, &[&str])] = &[
    ("file_type", &["bed narrowPeak"]),
    ("file_format", &["bed"]),
];

const RNA_SEQ: &[(&str, &[&str])] = &[
    ("output_type", &["gene quantifications"]),
    ("file_format", &["tsv"]),
];

/// Required-field rules for an assay classification: every listed
/// property must be present with a value in its allowed list.
pub fn assay_requirements(assay: &str) -> Option<&'static [(&'static str, &'static [&'static str])]> {
    match assay {
        "ChIP-seq" => Some(CHIP_SEQ),
        "DNase-seq" => Some(DNASE_SEQ),
        "eCLIP" => Some(ECLIP),
        "RNA-seq" => Some(RNA_SEQ),
        _ => None,
    }
}

/// Assay classifications with a requirement set.
pub fn indexed_assays() -> Vec<&'static str> {
    vec!["ChIP-seq", "DNase-seq", "eCLIP", "RNA-seq"]
}

/// Whether an entity may have files that belong in the region index.
pub fn candidate_entity(entity: &EntitySnapshot) -> bool {
    if !entity.type_tags.iter().any(|t| t == INDEXABLE_TYPE) {
        return false;
    }
    if !entity
        .status
        .as_deref()
        .map(|s| ALLOWED_STATUSES.contains(&s))
        .unwrap_or(false)
    {
        return false;
    }
    let Some(assay) = entity.assay_term_name.as_deref() else {
        return false;
    };
    if assay_requirements(assay).is_none() {
        return false;
    }
    !entity.files.is_empty()
}

/// Whether a file should be resident in the region index.
///
/// AND across required properties, OR within each allowed-value list.
pub fn candidate_file(file: &FileDescriptor, assay: &str) -> bool {
    if !file
        .status
        .as_deref()
        .map(|s| ALLOWED_STATUSES.contains(&s))
        .unwrap_or(false)
    {
        return false;
    }
    if file.href.is_none() {
        return false;
    }
    if !file
        .assembly
        .as_deref()
        .map(supported_assembly)
        .unwrap_or(false)
    {
        return false;
    }

    let Some(required) = assay_requirements(assay) else {
        return false;
    };
    required.iter().all(|(prop, allowed)| {
        file.property(prop)
            .map(|value| allowed.contains(&value))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn dnase_file() -> FileDescriptor {
        FileDescriptor {
            uuid: Uuid::new_v4(),
            status: Some("released".to_string()),
            href: Some("/files/x/@@download/x.bed.gz".to_string()),
            assembly: Some("hg19".to_string()),
            file_format: Some("bed".to_string()),
            output_type: None,
            file_type: Some("bed narrowPeak".to_string()),
            genome_annotation: None,
        }
    }

    fn experiment(assay: &str, files: Vec<FileDescriptor>) -> EntitySnapshot {
        EntitySnapshot {
            uuid: Uuid::new_v4(),
            type_tags: vec!["Experiment".to_string(), "Dataset".to_string()],
            status: Some("released".to_string()),
            assay_term_name: Some(assay.to_string()),
            accession: None,
            files,
        }
    }

    #[test]
    fn test_candidate_entity_accepts_released_experiment() {
        assert!(candidate_entity(&experiment("DNase-seq", vec![dnase_file()])));
    }

    #[test]
    fn test_candidate_entity_rejections() {
        let mut e = experiment("DNase-seq", vec![dnase_file()]);
        e.type_tags = vec!["Annotation".to_string()];
        assert!(!candidate_entity(&e));

        let mut e = experiment("DNase-seq", vec![dnase_file()]);
        e.status = Some("archived".to_string());
        assert!(!candidate_entity(&e));

        let e = experiment("ATAC-seq", vec![dnase_file()]);
        assert!(!candidate_entity(&e));

        let mut e = experiment("DNase-seq", vec![dnase_file()]);
        e.assay_term_name = None;
        assert!(!candidate_entity(&e));

        let e = experiment("DNase-seq", Vec::new());
        assert!(!candidate_entity(&e));
    }

    #[test]
    fn test_candidate_file_accepts_matching_file() {
        assert!(candidate_file(&dnase_file(), "DNase-seq"));
    }

    #[test]
    fn test_candidate_file_assembly_alias() {
        let mut f = dnase_file();
        f.assembly = Some("mm10-minimal".to_string());
        assert!(candidate_file(&f, "DNase-seq"));
    }

    #[test]
    fn test_candidate_file_requires_every_property() {
        // flipping any required field outside its allowed set fails the
        // file, regardless of the others being valid
        let mut f = dnase_file();
        f.file_type = Some("bed broadPeak".to_string());
        assert!(!candidate_file(&f, "DNase-seq"));

        let mut f = dnase_file();
        f.file_format = Some("bigBed".to_string());
        assert!(!candidate_file(&f, "DNase-seq"));

        let mut f = dnase_file();
        f.file_type = None;
        assert!(!candidate_file(&f, "DNase-seq"));
    }

    #[test]
    fn test_candidate_file_status_href_assembly_gates() {
        let mut f = dnase_file();
        f.status = Some("revoked".to_string());
        assert!(!candidate_file(&f, "DNase-seq"));

        let mut f = dnase_file();
        f.href = None;
        assert!(!candidate_file(&f, "DNase-seq"));

        let mut f = dnase_file();
        f.assembly = Some("danRer10".to_string());
        assert!(!candidate_file(&f, "DNase-seq"));

        let mut f = dnase_file();
        f.assembly = None;
        assert!(!candidate_file(&f, "DNase-seq"));
    }

    #[test]
    fn test_candidate_file_unknown_assay() {
        assert!(!candidate_file(&dnase_file(), "ATAC-seq"));
    }

    #[test]
    fn test_chip_seq_requires_idr_peaks() {
        let mut f = dnase_file();
        f.output_type = Some("optimal idr thresholded peaks".to_string());
        assert!(candidate_file(&f, "ChIP-seq"));

        f.output_type = Some("peaks".to_string());
        assert!(!candidate_file(&f, "ChIP-seq"));
    }

    #[test]
    fn test_rna_seq_requires_tsv_quantifications() {
        let mut f = dnase_file();
        f.file_format = Some("tsv".to_string());
        f.output_type = Some("gene quantifications".to_string());
        assert!(candidate_file(&f, "RNA-seq"));

        f.file_format = Some("bed".to_string());
        assert!(!candidate_file(&f, "RNA-seq"));
    }
}
