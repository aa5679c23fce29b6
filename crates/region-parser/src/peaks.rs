//! Peak-row grammar: positional genomic intervals.

use std::collections::BTreeMap;
use std::io::BufRead;

use tracing::warn;

use region_types::Interval;

use crate::error::ParseError;
use crate::rows::for_each_row;

/// Result of parsing a peak source: intervals grouped per chromosome,
/// plus how many rows were skipped as malformed.
#[derive(Debug, Default, PartialEq)]
pub struct PeakParse {
    /// Lower-cased chromosome -> intervals in source order
    pub regions: BTreeMap<String, Vec<Interval>>,
    /// Rows dropped for being short or non-numeric
    pub skipped: usize,
}

impl PeakParse {
    /// Total intervals across all chromosomes.
    pub fn len(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    /// True when no row produced an interval.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Parse peak rows: column 0 is the chromosome (lower-cased), columns 1
/// and 2 are the half-open start/end, stored shifted +1 on both bounds.
///
/// A row that is short, non-numeric, negative, or inverted is logged and
/// skipped; the rest of the source is still parsed.
pub fn parse_peaks<R: BufRead>(reader: R) -> Result<PeakParse, ParseError> {
    let mut parse = PeakParse::default();

    for_each_row(reader, |line_no, cols| match read_peak_row(cols) {
        Some((chrom, interval)) => {
            parse.regions.entry(chrom).or_default().push(interval);
        }
        None => {
            warn!(line = line_no, "skipping malformed peak row");
            parse.skipped += 1;
        }
    })?;

    Ok(parse)
}

fn read_peak_row(cols: &[&str]) -> Option<(String, Interval)> {
    if cols.len() < 3 {
        return None;
    }
    let start: i64 = cols[1].trim().parse().ok()?;
    let end: i64 = cols[2].trim().parse().ok()?;
    if start < 0 || end < start {
        return None;
    }
    Some((cols[0].to_lowercase(), Interval::from_row(start, end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_groups_by_chromosome() {
        let src = b"chr1\t10\t20\nchr1\t30\t40\nchrX\t5\t8\n" as &[u8];
        let parse = parse_peaks(src).unwrap();

        assert_eq!(parse.skipped, 0);
        assert_eq!(parse.len(), 3);
        assert_eq!(
            parse.regions["chr1"],
            vec![Interval { start: 11, end: 21 }, Interval { start: 31, end: 41 }]
        );
        // chromosome names are lower-cased
        assert_eq!(parse.regions["chrx"], vec![Interval { start: 6, end: 9 }]);
    }

    #[test]
    fn test_malformed_row_is_skipped_not_fatal() {
        let src = b"chr1\t10\t20\nchr2\tnot_a_number\t40\nchr3\t1\t2\n" as &[u8];
        let parse = parse_peaks(src).unwrap();

        assert_eq!(parse.len(), 2);
        assert_eq!(parse.skipped, 1);
        assert!(parse.regions.contains_key("chr1"));
        assert!(parse.regions.contains_key("chr3"));
    }

    #[test]
    fn test_short_row_is_skipped() {
        let src = b"chr1\t10\nchr1\t10\t20\n" as &[u8];
        let parse = parse_peaks(src).unwrap();
        assert_eq!(parse.len(), 1);
        assert_eq!(parse.skipped, 1);
    }

    #[test]
    fn test_negative_and_inverted_rows_are_skipped() {
        let src = b"chr1\t-5\t20\nchr1\t30\t10\n" as &[u8];
        let parse = parse_peaks(src).unwrap();
        assert!(parse.is_empty());
        assert_eq!(parse.skipped, 2);
    }

    #[test]
    fn test_empty_source() {
        let parse = parse_peaks(b"" as &[u8]).unwrap();
        assert!(parse.is_empty());
        assert_eq!(parse.skipped, 0);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        // narrowPeak rows carry score/strand/signal columns past the first three
        let src = b"chr1\t10\t20\tpeak_1\t0\t.\t1.5\t-1\t-1\t75\n" as &[u8];
        let parse = parse_peaks(src).unwrap();
        assert_eq!(parse.len(), 1);
        assert_eq!(parse.regions["chr1"][0], Interval { start: 11, end: 21 });
    }
}
