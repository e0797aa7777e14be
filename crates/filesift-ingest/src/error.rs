//! Error and warning types for ingest runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop a classification run before it starts.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Permission denied for the root path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Root path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl IngestError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Kind of ingest warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A directory could not be read.
    ReadError,
    /// An entry's metadata could not be read.
    MetadataError,
}

/// An entry skipped during a run. The run itself carries on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestWarning {
    pub path: PathBuf,
    pub message: String,
    pub kind: WarningKind,
}

impl IngestWarning {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_maps_common_kinds() {
        let err = IngestError::io(
            "/nope",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, IngestError::NotFound { .. }));

        let err = IngestError::io(
            "/locked",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no"),
        );
        assert!(matches!(err, IngestError::PermissionDenied { .. }));

        let err = IngestError::io("/odd", std::io::Error::other("odd"));
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
