/// Public entry points for loading STL files
use std::path::Path;

use crate::detect::{detect_format, StlFormat};
use crate::error::Result;
use crate::geometry::Mesh;
use crate::interner::VertexInterner;
use crate::stl;

/// Reusable STL loader.
///
/// The loader keeps one vertex interner allocation between calls so that a
/// batch of large files does not regrow the map from scratch. Interned points
/// are dropped when each decode ends, whether it succeeds or fails, so no
/// dedup state leaks from one file into the next; only the capacity stays.
/// Use [`StlLoader::release`] to give that memory back once the batch is done.
#[derive(Debug, Default)]
pub struct StlLoader {
    interner: VertexInterner,
}

impl StlLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect the encoding and decode with the matching decoder.
    ///
    /// This is the safe choice for files of unknown kind. Callers that know
    /// the encoding can skip the detection read with [`Self::load_binary`]
    /// or [`Self::load_ascii`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Mesh> {
        let path = path.as_ref();
        let format = detect_format(path)?;
        tracing::debug!(path = %path.display(), ?format, "detected STL encoding");

        match format {
            StlFormat::Binary => self.load_binary(path),
            StlFormat::Ascii => self.load_ascii(path),
        }
    }

    /// Decode a binary STL.
    ///
    /// Calling this on an ASCII file is undefined: the triangle count is taken
    /// from text bytes, which usually ends in a truncation error and may
    /// allocate heavily or produce garbage first. Use [`Self::load`] when in
    /// doubt.
    pub fn load_binary(&mut self, path: impl AsRef<Path>) -> Result<Mesh> {
        stl::load_binary(path.as_ref(), &mut self.interner)
    }

    /// Decode an ASCII STL.
    ///
    /// Calling this on a binary file returns an empty or meaningless mesh.
    pub fn load_ascii(&mut self, path: impl AsRef<Path>) -> Result<Mesh> {
        stl::load_ascii(path.as_ref(), &mut self.interner)
    }

    /// Decide what happens to the interner allocation kept between decodes.
    ///
    /// With `reclaim` the allocation is returned to the allocator; without it
    /// the capacity stays for the next file. Either way the next decode
    /// behaves exactly as on a new loader.
    pub fn release(&mut self, reclaim: bool) {
        if reclaim {
            self.interner.release();
        } else {
            self.interner.clear();
        }
        tracing::debug!(reclaim, "released vertex interner");
    }

    /// Capacity currently held by the vertex interner
    pub fn retained_capacity(&self) -> usize {
        self.interner.capacity()
    }

    /// Points still held by the vertex interner; zero between decodes
    pub fn retained_points(&self) -> usize {
        self.interner.len()
    }
}

/// Load an STL file of either encoding
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    StlLoader::new().load(path)
}

/// Load a binary STL file; see [`StlLoader::load_binary`]
pub fn load_binary_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    StlLoader::new().load_binary(path)
}

/// Load an ASCII STL file; see [`StlLoader::load_ascii`]
pub fn load_ascii_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    StlLoader::new().load_ascii(path)
}
