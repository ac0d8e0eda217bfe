//! Quiescence guard: decides when a freshly seen file has stopped being written.
//!
//! Creation events fire when a write starts. The default policy simply waits a
//! fixed delay, which is a heuristic: a copy that takes longer than the delay is
//! still growing when the encoder opens it. The `stable_size` policy adds a poll
//! of size and mtime after the delay and only admits the file once they stop
//! changing (or the upper bound is hit).

use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::{QuiescenceConfig, QuiescencePolicy};

/// Result of waiting on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The file can be handed to the encoder.
    Ready,
    /// Polling hit `max_wait_ms` while the file was still changing; treated as ready.
    TimedOut,
    /// The file no longer exists.
    Vanished,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready | Self::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observation {
    len: u64,
    modified: Option<SystemTime>,
}

#[derive(Debug, Clone)]
pub struct QuiescenceGuard {
    policy: QuiescencePolicy,
    delay: Duration,
    poll_interval: Duration,
    stable_polls: u32,
    max_wait: Duration,
}

impl QuiescenceGuard {
    pub fn new(config: &QuiescenceConfig) -> Self {
        Self {
            policy: config.policy,
            delay: Duration::from_millis(config.delay_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            stable_polls: config.stable_polls.max(1),
            max_wait: Duration::from_millis(config.max_wait_ms),
        }
    }

    /// Fixed-delay guard.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            policy: QuiescencePolicy::Fixed,
            delay,
            poll_interval: Duration::ZERO,
            stable_polls: 1,
            max_wait: Duration::ZERO,
        }
    }

    /// Guard that admits everything immediately (tests, trusted producers).
    pub fn immediate() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn policy(&self) -> QuiescencePolicy {
        self.policy
    }

    /// Waits until `path` looks finished.
    ///
    /// The fixed policy never touches the filesystem, matching the historic
    /// behaviour; a missing file is left for the encoder to report.
    pub async fn wait_until_ready(&self, path: &Path) -> Readiness {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.policy {
            QuiescencePolicy::Fixed => Readiness::Ready,
            QuiescencePolicy::StableSize => self.poll_until_stable(path).await,
        }
    }

    async fn poll_until_stable(&self, path: &Path) -> Readiness {
        let deadline = Instant::now() + self.max_wait;
        let Some(mut last) = observe(path).await else {
            return Readiness::Vanished;
        };
        let mut unchanged = 0u32;

        loop {
            if Instant::now() >= deadline {
                warn!(
                    "File {} still changing after {:?}, processing anyway",
                    path.display(),
                    self.max_wait
                );
                return Readiness::TimedOut;
            }

            sleep(self.poll_interval).await;

            let Some(current) = observe(path).await else {
                return Readiness::Vanished;
            };

            if current == last {
                unchanged += 1;
                if unchanged >= self.stable_polls {
                    return Readiness::Ready;
                }
            } else {
                debug!(
                    "File {} still growing ({} -> {} bytes)",
                    path.display(),
                    last.len,
                    current.len
                );
                unchanged = 0;
                last = current;
            }
        }
    }
}

async fn observe(path: &Path) -> Option<Observation> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    Some(Observation {
        len: meta.len(),
        modified: meta.modified().ok(),
    })
}
