use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a whole release pair. Per-file problems never surface
/// here; they are collected in the [`DiffReport`](crate::DiffReport).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("release folder not found: {0:?}")]
    MissingSource(PathBuf),

    #[error("failed to prepare output directory {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("diff task failed: {0}")]
    TaskFailed(String),
}

pub type DriverResult<T> = Result<T, DriverError>;
