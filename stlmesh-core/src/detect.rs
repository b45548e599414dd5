/// Binary vs ASCII STL detection
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{LoadError, Result};
use crate::record::read_line;

/// Upper bound on bytes read while detecting the encoding
pub const DETECT_LIMIT: u64 = 64 * 1024;

/// The two STL encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    Binary,
    Ascii,
}

/// Classify a file by its second line.
///
/// Binary files are supposed to avoid starting with `solid`, but plenty of
/// exporters ignore that, so the first line says nothing. An ASCII file's
/// second line is its first `facet normal`; anything else is treated as
/// binary, including files with fewer than two lines. Lines end at `\n`,
/// `\r\n` or a lone `\r`.
///
/// Detection uses its own file handle and never reads more than
/// [`DETECT_LIMIT`] bytes.
pub fn detect_format(path: &Path) -> Result<StlFormat> {
    let file = File::open(path).map_err(|e| LoadError::importing(path, e))?;
    let mut reader = BufReader::new(file.take(DETECT_LIMIT));

    let mut line = Vec::new();
    read_line(&mut reader, &mut line).map_err(|e| LoadError::importing(path, e))?;
    line.clear();
    read_line(&mut reader, &mut line).map_err(|e| LoadError::importing(path, e))?;

    Ok(classify_second_line(&line))
}

fn classify_second_line(line: &[u8]) -> StlFormat {
    if line.windows(5).any(|w| w == b"facet") {
        StlFormat::Ascii
    } else {
        StlFormat::Binary
    }
}
