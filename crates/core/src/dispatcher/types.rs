//! Types for dispatcher results and statistics.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::executor::JobOutcome;

/// How the dispatcher disposed of one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not a video or audio file.
    Ignored,
    /// Another job already holds the path.
    Duplicate,
    /// The file disappeared while waiting for it to settle.
    Vanished,
    /// The encoder ran; see the outcome.
    Completed(JobOutcome),
}

/// Counters since the dispatcher was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStats {
    pub seen: u64,
    pub ignored: u64,
    pub duplicates: u64,
    pub vanished: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl DispatcherStats {
    /// Jobs that reached the encoder.
    pub fn attempted(&self) -> u64 {
        self.succeeded + self.failed
    }
}

#[derive(Default)]
pub(super) struct StatCounters {
    pub seen: AtomicU64,
    pub ignored: AtomicU64,
    pub duplicates: AtomicU64,
    pub vanished: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
}

impl StatCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatcherStats {
        DispatcherStats {
            seen: self.seen.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            vanished: self.vanished.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
