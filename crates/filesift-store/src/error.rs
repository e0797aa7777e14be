//! Errors raised while reading or writing definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or write a definitions collection.
///
/// Returned from every `get`/`set` on the manager; a failed read means no
/// collection can be trusted and a failed write means the edits were not saved.
#[derive(Debug, Error)]
pub enum DefinitionsError {
    /// I/O error on a definitions file.
    #[error("Failed to access definitions at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file could not be encoded or decoded.
    #[error("Failed to (de)serialize definitions at {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A set is stored under a key other than its own name.
    #[error("Definitions at {path} store set '{name}' under key '{key}'")]
    KeyMismatch {
        path: PathBuf,
        key: String,
        name: String,
    },

    /// The legacy XML document is not a valid definitions file.
    #[error("Malformed legacy definitions at {path}: {message}")]
    MalformedLegacy { path: PathBuf, message: String },
}

impl DefinitionsError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedLegacy {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for store operations.
pub type DefinitionsResult<T> = Result<T, DefinitionsError>;
