//! Error types for the event source.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The input root was missing and could not be created.
    #[error("Failed to create input directory {path}: {source}")]
    CreateInputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input root exists but is not a directory.
    #[error("Input path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The backlog walk did not finish.
    #[error("Backlog scan aborted: {reason}")]
    ScanAborted { reason: String },

    /// The filesystem watcher could not be created or attached.
    #[error("Failed to watch {path}: {source}")]
    WatchFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl SourceError {
    pub fn scan_aborted(reason: impl Into<String>) -> Self {
        Self::ScanAborted {
            reason: reason.into(),
        }
    }
}
