use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a pipeline run.
///
/// Fetch problems are not in here: they are recovered per item and end up in
/// the [`RunReport`](crate::write::RunReport) instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("destination {0} was already written in this run")]
    DuplicateWrite(PathBuf),

    #[error("sidebar manifest error: {0}")]
    Manifest(String),

    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Write {
            path: path.into(),
            source,
        }
    }
}
