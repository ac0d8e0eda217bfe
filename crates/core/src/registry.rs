//! In-flight registry: at most one active job per path.
//!
//! The only way to put a path in the registry is [`InFlightRegistry::claim`],
//! and the only way to take it out is dropping (or explicitly releasing) the
//! [`Claim`] it returns. Release therefore runs on every exit path of the
//! holder, including early returns and panics.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Concurrency-safe set of paths currently being processed.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically registers `path` if nobody holds it.
    ///
    /// Returns `None` when the path is already claimed; the caller must skip it.
    pub fn claim(&self, path: &Path) -> Option<Claim> {
        if self.lock().insert(path.to_path_buf()) {
            Some(Claim {
                registry: self.clone(),
                path: path.to_path_buf(),
                released: false,
            })
        } else {
            None
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the claimed paths, sorted for stable output.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().iter().cloned().collect();
        paths.sort();
        paths
    }

    fn release(&self, path: &Path) {
        self.lock().remove(path);
    }

    // A holder that panicked mid-insert cannot leave the set half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.paths.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("in_flight", &self.len())
            .finish()
    }
}

/// Exclusive hold on one path. Releases exactly once.
#[must_use = "dropping a claim releases the path immediately"]
pub struct Claim {
    registry: InFlightRegistry,
    path: PathBuf,
    released: bool,
}

impl Claim {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the path now instead of at end of scope.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(&self.path);
        }
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claim").field("path", &self.path).finish()
    }
}
