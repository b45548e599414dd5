/// Error types for STL loading
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// A failed decode. Carries the file path and the underlying cause; a
/// partially assembled mesh is never returned alongside it.
#[derive(Error, Debug)]
#[error("{message} [{}]", .path.display())]
pub struct LoadError {
    message: &'static str,
    path: PathBuf,
    #[source]
    cause: LoadErrorCause,
}

/// What went wrong underneath a [`LoadError`]
#[derive(Error, Debug)]
pub enum LoadErrorCause {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid ASCII STL: first line does not start with `solid`")]
    NotSolid,

    #[error("line {line}: expected three floats, got {text:?}")]
    Float { line: usize, text: String },

    #[error("line {line}: file ends inside a facet")]
    UnexpectedEof { line: usize },

    #[error("truncated at byte {offset}: {needed} more bytes required")]
    Truncated { offset: usize, needed: usize },

    #[error("mesh needs more than {} indices", u32::MAX)]
    IndexOverflow,
}

impl LoadError {
    pub(crate) fn new(message: &'static str, path: &Path, cause: impl Into<LoadErrorCause>) -> Self {
        Self {
            message,
            path: path.to_path_buf(),
            cause: cause.into(),
        }
    }

    pub(crate) fn importing(path: &Path, cause: impl Into<LoadErrorCause>) -> Self {
        Self::new("error importing file", path, cause)
    }

    pub(crate) fn binary(path: &Path, cause: impl Into<LoadErrorCause>) -> Self {
        Self::new("error loading binary STL", path, cause)
    }

    pub(crate) fn ascii(path: &Path, cause: impl Into<LoadErrorCause>) -> Self {
        Self::new("error loading ASCII STL", path, cause)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cause(&self) -> &LoadErrorCause {
        &self.cause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_message_includes_path() {
        let err = LoadError::ascii(Path::new("/tmp/part.stl"), LoadErrorCause::NotSolid);
        assert_eq!(err.to_string(), "error loading ASCII STL [/tmp/part.stl]");
        assert!(matches!(err.cause(), LoadErrorCause::NotSolid));
    }

    #[test]
    fn test_io_cause_is_exposed_as_source() {
        let io = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = LoadError::importing(Path::new("missing.stl"), io);
        let source = err.source().expect("cause should be chained");
        assert_eq!(source.to_string(), "gone");
    }
}
