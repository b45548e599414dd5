/// STL decoders for binary and ASCII formats
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{LoadError, LoadErrorCause, Result};
use crate::geometry::{Mesh, MeshBuilder};
use crate::interner::VertexInterner;
use crate::record::{read_line, vector3_on_line, RecordReader, RECORD_LEN};

/// Decode a binary STL held in memory.
///
/// The declared triangle count is trusted: if the data ends early the decode
/// fails with [`LoadErrorCause::Truncated`]. Bytes after the last triangle are
/// ignored. Feeding ASCII text here is undefined; the count is read from
/// whatever bytes sit at offset 80, which usually ends in a truncation error
/// and may produce garbage geometry.
pub fn parse_binary_stl(
    data: &[u8],
    interner: &mut VertexInterner,
) -> std::result::Result<Mesh, LoadErrorCause> {
    let mut reader = RecordReader::new(data);
    let triangle_count = reader.header()? as usize;

    // Never reserve for more triangles than the bytes can hold.
    let hint = triangle_count.min(reader.remaining() / RECORD_LEN);
    let mut builder = MeshBuilder::new(interner, hint);

    for _ in 0..triangle_count {
        let (normal, vertices) = reader.triangle()?;
        builder.push_triangle(normal, vertices)?;
    }

    Ok(builder.finish())
}

/// Decode a binary STL file through a read-only memory map.
pub(crate) fn load_binary(path: &Path, interner: &mut VertexInterner) -> Result<Mesh> {
    tracing::debug!(path = %path.display(), "decoding binary STL");

    let file = File::open(path).map_err(|e| LoadError::binary(path, e))?;
    let len = file
        .metadata()
        .map_err(|e| LoadError::binary(path, e))?
        .len();

    let decoded = if len == 0 {
        parse_binary_stl(&[], interner)
    } else {
        // SAFETY: the map is read-only and dropped before returning. A file
        // truncated by another process while mapped is outside our control.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| LoadError::binary(path, e))?;
        parse_binary_stl(&map, interner)
    };
    let mesh = decoded.map_err(|cause| LoadError::binary(path, cause))?;

    tracing::info!(
        path = %path.display(),
        triangles = mesh.triangle_count(),
        points = mesh.point_count(),
        "loaded binary STL"
    );
    Ok(mesh)
}

/// Line source that tolerates non-UTF-8 bytes and counts lines from 1.
/// `\n`, `\r\n` and a lone `\r` all end a line.
struct Lines<R> {
    inner: R,
    buf: Vec<u8>,
    line: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            line: 0,
        }
    }

    fn next_line(&mut self) -> std::result::Result<Option<String>, LoadErrorCause> {
        self.buf.clear();
        if read_line(&mut self.inner, &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// A line that must exist because a facet is still open
    fn facet_line(&mut self) -> std::result::Result<String, LoadErrorCause> {
        self.next_line()?
            .ok_or(LoadErrorCause::UnexpectedEof { line: self.line })
    }
}

/// Text after the first case-insensitive occurrence of `keyword`
fn after_keyword<'l>(line: &'l str, keyword: &str) -> Option<&'l str> {
    let pos = line
        .as_bytes()
        .windows(keyword.len())
        .position(|w| w.eq_ignore_ascii_case(keyword.as_bytes()))?;
    Some(&line[pos + keyword.len()..])
}

/// `text` without a leading case-insensitive `keyword`, if it has one
fn strip_keyword<'l>(text: &'l str, keyword: &str) -> &'l str {
    match text.get(..keyword.len()) {
        Some(head) if head.eq_ignore_ascii_case(keyword) => &text[keyword.len()..],
        _ => text,
    }
}

/// Decode an ASCII STL from a buffered reader.
///
/// Only the structure the loader relies on is checked: the first non-empty
/// line must start with `solid`. Every line containing `facet` opens a facet
/// whose next six lines are `outer loop`, three `vertex` lines, `endloop` and
/// `endfacet`; keywords other than `facet` and `vertex` are not inspected,
/// and a file that ends right after the third vertex keeps its last facet.
/// Other lines are skipped. Binary input yields an empty or meaningless mesh
/// rather than a crash.
pub fn parse_ascii_stl<R: BufRead>(
    reader: R,
    interner: &mut VertexInterner,
) -> std::result::Result<Mesh, LoadErrorCause> {
    let mut lines = Lines::new(reader);

    let first = loop {
        match lines.next_line()? {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line,
            None => return Err(LoadErrorCause::NotSolid),
        }
    };
    if !first.trim_start().starts_with("solid") {
        return Err(LoadErrorCause::NotSolid);
    }

    let mut builder = MeshBuilder::new(interner, 0);

    while let Some(line) = lines.next_line()? {
        let Some(tail) = after_keyword(&line, "facet") else {
            continue;
        };
        let tail = strip_keyword(tail.trim_start(), "normal");
        let normal = vector3_on_line(tail, lines.line)?;

        lines.facet_line()?; // outer loop

        let mut vertices = [[0.0f32; 3]; 3];
        for vertex in &mut vertices {
            let line = lines.facet_line()?;
            let tail = after_keyword(&line, "vertex").unwrap_or(line.as_str());
            *vertex = vector3_on_line(tail, lines.line)?;
        }

        builder.push_triangle(normal.into(), vertices.map(Into::into))?;

        // endloop and endfacet; a file cut off here still has a whole facet
        lines.next_line()?;
        lines.next_line()?;
    }

    Ok(builder.finish())
}

/// Decode an ASCII STL file line by line.
pub(crate) fn load_ascii(path: &Path, interner: &mut VertexInterner) -> Result<Mesh> {
    tracing::debug!(path = %path.display(), "decoding ASCII STL");

    let file = File::open(path).map_err(|e| LoadError::ascii(path, e))?;
    let mesh = parse_ascii_stl(BufReader::new(file), interner)
        .map_err(|cause| LoadError::ascii(path, cause))?;

    tracing::info!(
        path = %path.display(),
        triangles = mesh.triangle_count(),
        points = mesh.point_count(),
        "loaded ASCII STL"
    );
    Ok(mesh)
}
