//! Raw tab-separated row iteration shared by both grammars.

use std::io::BufRead;

use crate::error::ParseError;

/// Iterate rows of a tab-separated source, yielding column vectors.
///
/// No quoting or escaping: columns are plain `\t` splits, matching the
/// upstream file conventions. Empty lines are passed through as a single
/// empty column and left to the grammar to reject.
pub(crate) fn for_each_row<R, F>(reader: R, mut on_row: F) -> Result<(), ParseError>
where
    R: BufRead,
    F: FnMut(usize, &[&str]),
{
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let cols: Vec<&str> = line.split('\t').collect();
        on_row(line_no + 1, &cols);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_split_on_tabs_only() {
        let src = b"a\tb c\td\nx\ty\tz\n" as &[u8];
        let mut seen = Vec::new();
        for_each_row(src, |no, cols| {
            seen.push((no, cols.iter().map(|c| c.to_string()).collect::<Vec<_>>()));
        })
        .unwrap();

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, 1);
        assert_eq!(seen[0].1, vec!["a", "b c", "d"]);
        assert_eq!(seen[1].1, vec!["x", "y", "z"]);
    }
}
