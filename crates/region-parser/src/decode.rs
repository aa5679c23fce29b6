//! Transparent gzip handling for fetched sources.

use std::io::{BufRead, BufReader};

use flate2::bufread::GzDecoder;

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Wrap fetched bytes in a reader, gunzipping when the gzip magic is
/// present. Interval sources arrive either plain or as `.gz` downloads.
pub fn decode_source(bytes: &[u8]) -> Box<dyn BufRead + '_> {
    if bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC {
        Box::new(BufReader::new(GzDecoder::new(bytes)))
    } else {
        Box::new(bytes)
    }
}
