//! Error types for the Ridgeline terrain renderer

use std::collections::TryReserveError;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the renderer
#[derive(Debug, Error)]
pub enum Error {
    /// A required precursor is missing (no heightmap, terrain not initialized, ...)
    #[error("Not ready: {0}")]
    NotReady(&'static str),

    #[error("Unknown vertex format: {0}")]
    UnknownVertexFormat(u32),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Out of memory")]
    OutOfMemory,

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file opened but its contents failed validation
    #[error("Bad file: {0}")]
    BadFile(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

impl Error {
    /// Map an I/O error for `path`, turning `NotFound` into [`Error::FileNotFound`].
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.into())
        } else {
            Error::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_file_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::from_io(io, "terrain.raw");
        assert!(matches!(err, Error::FileNotFound(p) if p == PathBuf::from("terrain.raw")));
    }

    #[test]
    fn test_other_io_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(Error::from_io(io, "x"), Error::Io(_)));
    }

    #[test]
    fn test_try_reserve_is_out_of_memory() {
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert!(matches!(Error::from(err), Error::OutOfMemory));
    }
}
