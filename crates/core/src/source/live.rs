//! Live filesystem watcher.

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::error::SourceError;
use super::scan::expand_arrival;
use super::types::{Origin, WatchedPath};

/// Recursive watch on the input root. Dropping it stops delivery.
pub struct LiveWatcher {
    watcher: RecommendedWatcher,
    root: PathBuf,
}

impl LiveWatcher {
    /// Attaches a recursive watcher to `root` and forwards arrivals to `tx`.
    ///
    /// Failing to create or attach the watcher is an error for the caller;
    /// errors reported by the backend afterwards are only logged.
    pub fn attach(root: &Path, tx: mpsc::UnboundedSender<WatchedPath>) -> Result<Self, SourceError> {
        let watch_failed = |source| SourceError::WatchFailed {
            path: root.to_path_buf(),
            source,
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for path in arrival_paths(&event) {
                        for arrival in expand_arrival(&path, Origin::Live) {
                            debug!("File watch event: {}", arrival.path.display());
                            if tx.send(arrival).is_err() {
                                debug!("Dispatcher gone, dropping watch event");
                                return;
                            }
                        }
                    }
                }
                Err(e) => error!("Watch error: {}", e),
            },
            Config::default(),
        )
        .map_err(watch_failed)?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(watch_failed)?;
        info!("Watching {} for new files", root.display());

        Ok(Self {
            watcher,
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Detaches from the tree. No events are delivered after this returns.
    pub fn stop(mut self) {
        if let Err(e) = self.watcher.unwatch(&self.root) {
            debug!("Unwatch of {} failed: {}", self.root.display(), e);
        }
        info!("Stopped watching {}", self.root.display());
    }
}

/// Paths a notification reports as newly arrived.
///
/// Creations and renames into the tree count; everything else (writes,
/// metadata changes, removals, renames away) is ignored.
///
/// A rename is taken from its `To` half only. Backends that pair the two
/// halves also report `Both` for the same rename, and in-tree renames would
/// otherwise arrive twice.
pub fn arrival_paths(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) => event.paths.clone(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.clone(),
        _ => Vec::new(),
    }
}
