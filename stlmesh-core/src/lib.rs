//! stlmesh core library - STL decoding into an indexed triangle mesh
//!
//! Binary and ASCII STL files are decoded into a [`Mesh`] whose points are
//! deduplicated by exact value and whose faces reference points, per-face
//! normals and a placeholder texture coordinate by index.

pub mod detect;
pub mod error;
pub mod geometry;
pub mod interner;
pub mod loader;
pub mod record;
pub mod stl;

// Re-export commonly used types
pub use detect::{detect_format, StlFormat};
pub use error::{LoadError, LoadErrorCause, Result};
pub use geometry::{Face, FaceVertex, Mesh};
pub use interner::VertexInterner;
pub use loader::{load_ascii_stl, load_binary_stl, load_stl, StlLoader};
