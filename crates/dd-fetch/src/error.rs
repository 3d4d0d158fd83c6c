use std::path::PathBuf;
use std::time::Duration;

use dd_types::Version;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract {path:?}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("invalid version log: {0}")]
    VersionLog(#[from] serde_json::Error),

    #[error("release {version} is unavailable: {reason}")]
    Unavailable { version: Version, reason: String },

    #[error("timed out after {waited:?} waiting for release {version}")]
    Timeout { version: Version, waited: Duration },

    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
