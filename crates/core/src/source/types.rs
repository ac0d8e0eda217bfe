//! Types flowing from the event source to the dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which producer reported a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Found by the startup walk.
    Backlog,
    /// Reported by the filesystem watcher.
    Live,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backlog => f.write_str("backlog"),
            Self::Live => f.write_str("live"),
        }
    }
}

/// A path on its way through the pipeline. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedPath {
    pub path: PathBuf,
    /// Lowercased extension, if the file name has one.
    pub extension: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub origin: Origin,
}

impl WatchedPath {
    pub fn new(path: impl Into<PathBuf>, origin: Origin) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        Self {
            path,
            extension,
            discovered_at: Utc::now(),
            origin,
        }
    }

    pub fn backlog(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Origin::Backlog)
    }

    pub fn live(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Origin::Live)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
