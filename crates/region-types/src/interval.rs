//! Parsed row types produced by the interval parser.
//!
//! Intervals are ephemeral: constructed during parse, batched per
//! chromosome, and consumed immediately by the projector.

use serde::{Deserialize, Serialize};

/// A genomic position span on one chromosome.
///
/// Coordinates are stored closed on both ends, shifted by +1 from the
/// half-open rows in the source file. Invariant: `start >= 1` and
/// `end >= start` for any interval the parser emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// 1-based inclusive start position
    pub start: i64,
    /// 1-based inclusive end position
    pub end: i64,
}

impl Interval {
    /// Build an interval from a half-open source row, applying the +1
    /// shift to both bounds.
    pub fn from_row(start: i64, end: i64) -> Self {
        Self {
            start: start + 1,
            end: end + 1,
        }
    }
}

/// One quantification row from a gene-quantification source.
///
/// Rows with neither TPM nor FPKM above zero are filtered out at parse
/// time and never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRow {
    /// Transcript identifier (column 0)
    pub transcript_id: String,
    /// Gene identifier (column 1)
    pub gene_id: String,
    /// Transcripts per million (column 5)
    pub tpm: f64,
    /// Fragments per kilobase million (column 6)
    pub fpkm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_row_shifts_both_bounds() {
        let iv = Interval::from_row(10, 20);
        assert_eq!(iv.start, 11);
        assert_eq!(iv.end, 21);
    }

    #[test]
    fn test_interval_from_row_zero_start() {
        let iv = Interval::from_row(0, 0);
        assert_eq!(iv.start, 1);
        assert_eq!(iv.end, 1);
    }

    #[test]
    fn test_interval_serialization() {
        let iv = Interval { start: 11, end: 21 };
        let json = serde_json::to_string(&iv).unwrap();
        assert_eq!(json, r#"{"start":11,"end":21}"#);
    }

    #[test]
    fn test_expression_row_roundtrip() {
        let row = ExpressionRow {
            transcript_id: "ENST00000456328".to_string(),
            gene_id: "ENSG00000223972".to_string(),
            tpm: 0.13,
            fpkm: 0.09,
        };
        let json = serde_json::to_string(&row).unwrap();
        let decoded: ExpressionRow = serde_json::from_str(&json).unwrap();
        assert_eq!(row, decoded);
    }
}
