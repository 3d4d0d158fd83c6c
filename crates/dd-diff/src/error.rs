//! Error types for the diff crate.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while diffing a single file.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A structured document could not be parsed.
    #[error("malformed document {path:?}: {source}")]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Hashing an asset failed.
    #[error("hash error: {0}")]
    Hash(#[from] dd_crypto::HasherError),

    /// Serialization of a patch failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DiffError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
