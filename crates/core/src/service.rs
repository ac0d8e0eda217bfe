//! Ingest service: backlog scan, live watch and dispatch, wired together.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use crate::config::Config;
use crate::dispatcher::{Dispatcher, DispatcherStats};
use crate::encoder::Encoder;
use crate::executor::TranscodeExecutor;
use crate::source::{scan_backlog, LiveWatcher, SourceError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Ingest service is already running")]
    AlreadyRunning,
}

pub struct IngestService<E: Encoder + 'static> {
    input_dir: PathBuf,
    dispatcher: Dispatcher<E>,
    running: Arc<AtomicBool>,
}

impl<E: Encoder + 'static> IngestService<E> {
    pub fn new(config: &Config, encoder: Arc<E>) -> Self {
        let executor = TranscodeExecutor::new(encoder, config.output.clone(), &config.encoder);
        Self {
            input_dir: config.watch.input_dir.clone(),
            dispatcher: Dispatcher::new(&config.watch, executor),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<E> {
        &self.dispatcher
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs until `shutdown` resolves.
    ///
    /// The backlog scan completes and every file it found is queued before
    /// the live watcher attaches. On shutdown the dispatcher stops taking
    /// queued paths, running jobs finish, then the watcher is detached.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<DispatcherStats, IngestError>
    where
        F: Future<Output = ()>,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(IngestError::AlreadyRunning);
        }
        let result = self.run_inner(shutdown).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner<F>(&self, shutdown: F) -> Result<DispatcherStats, IngestError>
    where
        F: Future<Output = ()>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);

        let input_dir = self.input_dir.clone();
        let backlog = tokio::task::spawn_blocking(move || scan_backlog(&input_dir))
            .await
            .map_err(|e| SourceError::scan_aborted(e.to_string()))??;

        info!(
            "Found {} existing files in {}",
            backlog.len(),
            self.input_dir.display()
        );
        for watched in backlog {
            // The receiver is still held here.
            let _ = tx.send(watched);
        }

        let watcher = LiveWatcher::attach(&self.input_dir, tx)?;

        let dispatch = self.dispatcher.run(rx, stop_rx);
        tokio::pin!(dispatch);
        tokio::pin!(shutdown);

        let finished_early = tokio::select! {
            stats = &mut dispatch => Some(stats),
            _ = &mut shutdown => None,
        };

        let stats = match finished_early {
            Some(stats) => {
                warn!("Event delivery stopped; ingest service exiting");
                stats
            }
            None => {
                info!("Shutdown requested, finishing running jobs");
                let _ = stop_tx.send(());
                dispatch.await
            }
        };

        watcher.stop();
        Ok(stats)
    }
}
