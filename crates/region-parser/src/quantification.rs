//! Quantification-row grammar: transcript/gene expression levels.

use std::io::BufRead;

use tracing::warn;

use region_types::ExpressionRow;

use crate::error::ParseError;
use crate::rows::for_each_row;

/// Result of parsing a quantification source.
#[derive(Debug, Default, PartialEq)]
pub struct QuantParse {
    /// Rows with TPM or FPKM above zero, in source order
    pub rows: Vec<ExpressionRow>,
    /// Rows dropped for being short or non-numeric
    pub skipped: usize,
}

/// Parse gene-quantification rows: columns 0 and 1 are transcript and
/// gene ids, columns 5 and 6 are TPM and FPKM. Only rows where either
/// level is above zero are kept; malformed rows are logged and skipped.
pub fn parse_quantifications<R: BufRead>(reader: R) -> Result<QuantParse, ParseError> {
    let mut parse = QuantParse::default();

    for_each_row(reader, |line_no, cols| match read_quant_row(cols) {
        Some(Some(row)) => parse.rows.push(row),
        Some(None) => {} // well-formed but expressionless, filtered
        None => {
            warn!(line = line_no, "skipping malformed quantification row");
            parse.skipped += 1;
        }
    })?;

    Ok(parse)
}

/// Outer `None` = malformed; inner `None` = filtered by the TPM/FPKM gate.
fn read_quant_row(cols: &[&str]) -> Option<Option<ExpressionRow>> {
    if cols.len() < 7 {
        return None;
    }
    let tpm: f64 = cols[5].trim().parse().ok()?;
    let fpkm: f64 = cols[6].trim().parse().ok()?;
    if tpm <= 0.0 && fpkm <= 0.0 {
        return Some(None);
    }
    Some(Some(ExpressionRow {
        transcript_id: cols[0].trim().to_string(),
        gene_id: cols[1].trim().to_string(),
        tpm,
        fpkm,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quant_line(t: &str, g: &str, tpm: &str, fpkm: &str) -> String {
        // columns 2-4 are length/effective-length/expected-count, unused here
        format!("{t}\t{g}\t1000\t850\t12.0\t{tpm}\t{fpkm}\n")
    }

    #[test]
    fn test_keeps_expressed_rows_only() {
        let mut src = String::new();
        src.push_str(&quant_line("ENST01", "ENSG01", "1.5", "0.0"));
        src.push_str(&quant_line("ENST02", "ENSG02", "0.0", "0.0"));
        src.push_str(&quant_line("ENST03", "ENSG03", "0.0", "2.25"));

        let parse = parse_quantifications(src.as_bytes()).unwrap();
        assert_eq!(parse.skipped, 0);
        assert_eq!(parse.rows.len(), 2);
        assert_eq!(parse.rows[0].transcript_id, "ENST01");
        assert_eq!(parse.rows[0].tpm, 1.5);
        assert_eq!(parse.rows[1].gene_id, "ENSG03");
        assert_eq!(parse.rows[1].fpkm, 2.25);
    }

    #[test]
    fn test_malformed_rows_skip_and_continue() {
        let mut src = String::new();
        src.push_str("ENST01\tENSG01\tshort_row\n");
        src.push_str(&quant_line("ENST02", "ENSG02", "not_a_number", "1.0"));
        src.push_str(&quant_line("ENST03", "ENSG03", "3.0", "1.0"));

        let parse = parse_quantifications(src.as_bytes()).unwrap();
        assert_eq!(parse.skipped, 2);
        assert_eq!(parse.rows.len(), 1);
        assert_eq!(parse.rows[0].transcript_id, "ENST03");
    }

    #[test]
    fn test_empty_source() {
        let parse = parse_quantifications(b"" as &[u8]).unwrap();
        assert!(parse.rows.is_empty());
        assert_eq!(parse.skipped, 0);
    }
}
