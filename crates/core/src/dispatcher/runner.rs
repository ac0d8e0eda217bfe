//! Dispatcher implementation.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::classifier::{classify, MediaKind};
use crate::config::WatchConfig;
use crate::encoder::Encoder;
use crate::executor::{JobOutcome, TranscodeExecutor};
use crate::quiescence::{QuiescenceGuard, Readiness};
use crate::registry::{Claim, InFlightRegistry};
use crate::source::WatchedPath;

use super::types::{DispatcherStats, Disposition, StatCounters};

/// Receives watched paths and runs each one to a terminal state.
pub struct Dispatcher<E: Encoder + 'static> {
    registry: InFlightRegistry,
    guard: QuiescenceGuard,
    executor: Arc<TranscodeExecutor<E>>,
    job_slots: Arc<Semaphore>,
    max_concurrent_jobs: usize,
    stats: Arc<StatCounters>,
}

impl<E: Encoder + 'static> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            guard: self.guard.clone(),
            executor: Arc::clone(&self.executor),
            job_slots: Arc::clone(&self.job_slots),
            max_concurrent_jobs: self.max_concurrent_jobs,
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<E: Encoder + 'static> Dispatcher<E> {
    pub fn new(config: &WatchConfig, executor: TranscodeExecutor<E>) -> Self {
        let max_concurrent_jobs = config.max_concurrent_jobs.max(1);
        Self {
            registry: InFlightRegistry::new(),
            guard: QuiescenceGuard::new(&config.quiescence),
            executor: Arc::new(executor),
            job_slots: Arc::new(Semaphore::new(max_concurrent_jobs)),
            max_concurrent_jobs,
            stats: Arc::new(StatCounters::default()),
        }
    }

    /// Replace the quiescence guard built from config.
    pub fn with_guard(mut self, guard: QuiescenceGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &TranscodeExecutor<E> {
        &self.executor
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs
    }

    pub fn stats(&self) -> DispatcherStats {
        self.stats.snapshot()
    }

    /// Runs one path through the state machine.
    ///
    /// The claim is held from before the quiescence wait until the encoder
    /// returns, and is released on every exit path.
    pub async fn handle(&self, watched: WatchedPath) -> Disposition {
        match self.admit(&watched) {
            Ok((kind, claim)) => self.process(watched, kind, claim).await,
            Err(disposition) => disposition,
        }
    }

    /// Classifies and claims a path. Ignored and already-claimed paths end here.
    fn admit(&self, watched: &WatchedPath) -> Result<(MediaKind, Claim), Disposition> {
        StatCounters::bump(&self.stats.seen);
        let path = watched.path();

        let kind = classify(path);
        if !kind.is_transcodable() {
            debug!("Ignoring non-media file: {}", path.display());
            StatCounters::bump(&self.stats.ignored);
            return Err(Disposition::Ignored);
        }

        let Some(claim) = self.registry.claim(path) else {
            debug!("Already processing {}, skipping", path.display());
            StatCounters::bump(&self.stats.duplicates);
            return Err(Disposition::Duplicate);
        };

        info!("New {} file detected ({}): {}", kind, watched.origin, path.display());
        Ok((kind, claim))
    }

    /// Waits for the file to settle, encodes it and releases the claim.
    async fn process(&self, watched: WatchedPath, kind: MediaKind, claim: Claim) -> Disposition {
        let path = watched.path();

        if self.guard.wait_until_ready(path).await == Readiness::Vanished {
            warn!("File disappeared before processing: {}", path.display());
            StatCounters::bump(&self.stats.vanished);
            return Disposition::Vanished;
        }

        let outcome = self.executor.execute(path, kind).await;
        claim.release();

        match &outcome {
            JobOutcome::Succeeded { .. } => StatCounters::bump(&self.stats.succeeded),
            JobOutcome::Failed { .. } => StatCounters::bump(&self.stats.failed),
        }
        Disposition::Completed(outcome)
    }

    /// Consumes paths from `paths` until shutdown is signalled or every
    /// sender is gone.
    ///
    /// Each path is classified and claimed as soon as it is dequeued, before
    /// it waits for a job slot, so a duplicate queued behind it is dropped
    /// rather than run again after the first job releases. At most
    /// `max_concurrent_jobs` paths are processed at once; with the default of
    /// one, paths are handled strictly in arrival order. On shutdown, paths
    /// still queued are abandoned (releasing any claim) and running jobs finish.
    pub async fn run(
        &self,
        mut paths: mpsc::UnboundedReceiver<WatchedPath>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> DispatcherStats {
        info!(
            "Dispatcher started (max {} concurrent jobs)",
            self.max_concurrent_jobs
        );
        let mut jobs = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    info!("Dispatcher received shutdown signal");
                    break;
                }

                Some(joined) = jobs.join_next(), if !jobs.is_empty() => {
                    if let Err(e) = joined {
                        error!("Transcode task failed: {}", e);
                    }
                }

                next = paths.recv() => {
                    let Some(watched) = next else {
                        info!("Event source closed");
                        break;
                    };

                    let Ok((kind, claim)) = self.admit(&watched) else {
                        continue;
                    };

                    let permit = tokio::select! {
                        biased;
                        _ = shutdown.recv() => {
                            info!("Dispatcher received shutdown signal");
                            break;
                        }
                        permit = Arc::clone(&self.job_slots).acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => break,
                        },
                    };

                    let dispatcher = self.clone();
                    jobs.spawn(async move {
                        let _permit = permit;
                        dispatcher.process(watched, kind, claim).await
                    });
                }
            }
        }

        let draining = jobs.len();
        if draining > 0 {
            info!("Waiting for {} running job(s) to finish", draining);
        }
        while let Some(joined) = jobs.join_next().await {
            if let Err(e) = joined {
                error!("Transcode task failed: {}", e);
            }
        }

        let stats = self.stats();
        info!(
            "Dispatcher stopped: {} seen, {} ignored, {} duplicates, {} vanished, {} succeeded, {} failed",
            stats.seen,
            stats.ignored,
            stats.duplicates,
            stats.vanished,
            stats.succeeded,
            stats.failed
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputConfig, QuiescenceConfig, QuiescencePolicy};
    use crate::encoder::EncoderConfig;
    use crate::testing::{fixtures::wait_for, MockEncoder};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn dispatcher(
        encoder: &MockEncoder,
        out: &Path,
        max_concurrent_jobs: usize,
    ) -> Dispatcher<MockEncoder> {
        let config = WatchConfig {
            max_concurrent_jobs,
            quiescence: QuiescenceConfig {
                delay_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let output = OutputConfig {
            movies_dir: out.join("movies"),
            tv_dir: out.join("tv"),
            music_dir: out.join("music"),
        };
        let executor =
            TranscodeExecutor::new(Arc::new(encoder.clone()), output, &EncoderConfig::default());
        Dispatcher::new(&config, executor)
    }

    #[tokio::test]
    async fn test_ignored_path_creates_no_job() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        let d = dispatcher(&encoder, dir.path(), 1);

        let disposition = d.handle(WatchedPath::live("/in/notes.txt")).await;
        assert_eq!(disposition, Disposition::Ignored);
        assert_eq!(encoder.encode_count(), 0);
        assert!(d.registry().is_empty());
        assert_eq!(d.stats().ignored, 1);
    }

    #[tokio::test]
    async fn test_success_releases_claim() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        let d = dispatcher(&encoder, dir.path(), 1);

        let disposition = d.handle(WatchedPath::live("/in/movie.mkv")).await;
        match disposition {
            Disposition::Completed(JobOutcome::Succeeded { output_path, .. }) => {
                assert_eq!(output_path, dir.path().join("movies").join("movie.mp4"));
            }
            other => panic!("unexpected disposition: {other:?}"),
        }
        assert!(d.registry().is_empty());
        assert_eq!(d.stats().succeeded, 1);
    }

    #[tokio::test]
    async fn test_failure_releases_claim() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        encoder.fail_path("/in/corrupt.flac", "Invalid data found when processing input");
        let d = dispatcher(&encoder, dir.path(), 1);

        let disposition = d.handle(WatchedPath::live("/in/corrupt.flac")).await;
        assert!(matches!(
            disposition,
            Disposition::Completed(JobOutcome::Failed { .. })
        ));
        assert!(d.registry().is_empty());
        assert_eq!(d.stats().failed, 1);
        assert!(!dir.path().join("music").join("corrupt.mp3").exists());
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_run_once() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        encoder.set_encode_duration(Duration::from_millis(100));
        let d = dispatcher(&encoder, dir.path(), 4);

        let dispositions = futures::future::join_all((0..8).map(|i| {
            let watched = if i == 0 {
                WatchedPath::backlog("/in/same.mkv")
            } else {
                WatchedPath::live("/in/same.mkv")
            };
            d.handle(watched)
        }))
        .await;

        let completed = dispositions
            .iter()
            .filter(|d| matches!(d, Disposition::Completed(_)))
            .count();
        assert_eq!(completed, 1);
        assert_eq!(encoder.encode_count(), 1);
        assert_eq!(encoder.max_concurrent_for("/in/same.mkv"), 1);
        assert_eq!(d.stats().duplicates, 7);
        assert!(d.registry().is_empty());
    }

    #[tokio::test]
    async fn test_vanished_file_is_not_encoded() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        let d = dispatcher(&encoder, dir.path(), 1).with_guard(QuiescenceGuard::new(
            &QuiescenceConfig {
                policy: QuiescencePolicy::StableSize,
                delay_ms: 0,
                poll_interval_ms: 10,
                stable_polls: 1,
                max_wait_ms: 1_000,
            },
        ));

        let gone = dir.path().join("gone.mkv");
        let disposition = d.handle(WatchedPath::live(&gone)).await;
        assert_eq!(disposition, Disposition::Vanished);
        assert_eq!(encoder.encode_count(), 0);
        assert!(d.registry().is_empty());
    }

    #[tokio::test]
    async fn test_run_processes_in_order_and_survives_failure() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        encoder.fail_path("/in/b.mkv", "boom");
        let d = dispatcher(&encoder, dir.path(), 1);

        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        for name in ["/in/a.mkv", "/in/b.mkv", "/in/c.txt", "/in/d.flac"] {
            tx.send(WatchedPath::live(name)).unwrap();
        }

        let runner = {
            let d = d.clone();
            tokio::spawn(async move { d.run(rx, stop_rx).await })
        };

        assert!(wait_for(Duration::from_secs(5), || encoder.encode_count() == 3).await);
        stop_tx.send(()).unwrap();
        let stats = runner.await.unwrap();

        assert_eq!(
            encoder.encoded_inputs(),
            vec![
                Path::new("/in/a.mkv").to_path_buf(),
                Path::new("/in/b.mkv").to_path_buf(),
                Path::new("/in/d.flac").to_path_buf(),
            ]
        );
        assert_eq!(encoder.max_concurrent(), 1);
        assert_eq!(stats.seen, 4);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.attempted(), 3);
    }

    #[tokio::test]
    async fn test_queued_duplicate_is_dropped_with_single_slot() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        encoder.set_encode_duration(Duration::from_millis(100));
        let d = dispatcher(&encoder, dir.path(), 1);

        let (tx, rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = broadcast::channel(1);
        // Two notifications for one rename, queued back to back.
        tx.send(WatchedPath::live("/in/movie.mkv")).unwrap();
        tx.send(WatchedPath::live("/in/movie.mkv")).unwrap();
        tx.send(WatchedPath::live("/in/other.flac")).unwrap();
        drop(tx);

        let stats = d.run(rx, stop_rx).await;

        assert_eq!(encoder.encodes_for("/in/movie.mkv"), 1);
        assert_eq!(encoder.encodes_for("/in/other.flac"), 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.succeeded, 2);
        assert!(d.registry().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_releases_claims_of_queued_paths() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        encoder.set_encode_duration(Duration::from_millis(200));
        let d = dispatcher(&encoder, dir.path(), 1);

        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        tx.send(WatchedPath::live("/in/first.mkv")).unwrap();
        tx.send(WatchedPath::live("/in/waiting.mkv")).unwrap();

        let runner = {
            let d = d.clone();
            tokio::spawn(async move { d.run(rx, stop_rx).await })
        };

        // The second path is claimed while it waits for the only slot.
        assert!(
            wait_for(Duration::from_secs(5), || d
                .registry()
                .contains(Path::new("/in/waiting.mkv")))
            .await
        );
        stop_tx.send(()).unwrap();
        runner.await.unwrap();

        assert_eq!(encoder.encodes_for("/in/waiting.mkv"), 0);
        assert!(d.registry().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_when_sources_close() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        let d = dispatcher(&encoder, dir.path(), 2);

        let (tx, rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = broadcast::channel(1);
        tx.send(WatchedPath::backlog("/in/a.mkv")).unwrap();
        tx.send(WatchedPath::backlog("/in/b.flac")).unwrap();
        drop(tx);

        let stats = d.run(rx, stop_rx).await;
        assert_eq!(stats.succeeded, 2);
        assert!(encoder.max_concurrent() <= 2);
        assert!(d.registry().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_lets_running_job_finish() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        encoder.set_encode_duration(Duration::from_millis(200));
        let d = dispatcher(&encoder, dir.path(), 1);

        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        tx.send(WatchedPath::live("/in/first.mkv")).unwrap();
        tx.send(WatchedPath::live("/in/second.mkv")).unwrap();

        let runner = {
            let d = d.clone();
            tokio::spawn(async move { d.run(rx, stop_rx).await })
        };

        // Shut down while the first encode is in progress.
        assert!(wait_for(Duration::from_secs(5), || !d.registry().is_empty()).await);
        stop_tx.send(()).unwrap();
        let stats = runner.await.unwrap();

        assert_eq!(encoder.encoded_inputs(), vec![Path::new("/in/first.mkv").to_path_buf()]);
        assert_eq!(stats.succeeded, 1);
        assert!(d.registry().is_empty());
    }
}
