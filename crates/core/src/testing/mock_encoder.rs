//! Mock encoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::encoder::{Encoder, EncoderError, TranscodeJob, TranscodeResult};

/// A recorded encode for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEncode {
    /// The job that was submitted.
    pub job: TranscodeJob,
    /// Whether the encode succeeded.
    pub success: bool,
}

#[derive(Debug, Default)]
struct Concurrency {
    active_total: usize,
    max_total: usize,
    active_by_path: HashMap<PathBuf, usize>,
    max_by_path: HashMap<PathBuf, usize>,
}

/// Mock implementation of the Encoder trait.
///
/// Provides controllable behavior for testing:
/// - Track encode jobs for assertions
/// - Simulate failures for specific inputs
/// - Simulate encode duration
/// - Measure overlap, globally and per input path
/// - Write an empty output file on success, like a real encoder would
///
/// # Example
///
/// ```rust,ignore
/// use mediawatch_core::testing::MockEncoder;
///
/// let encoder = MockEncoder::new();
/// encoder.fail_path("/input/broken.mkv", "moov atom not found");
///
/// // ... run the dispatcher ...
///
/// assert_eq!(encoder.encode_count(), 3);
/// assert_eq!(encoder.max_concurrent_for("/input/movie.mkv"), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockEncoder {
    encodes: Arc<Mutex<Vec<RecordedEncode>>>,
    failures: Arc<Mutex<HashMap<PathBuf, String>>>,
    duration: Arc<Mutex<Duration>>,
    write_outputs: Arc<Mutex<bool>>,
    concurrency: Arc<Mutex<Concurrency>>,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockEncoder {
    /// Create a new mock encoder.
    pub fn new() -> Self {
        Self {
            encodes: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            duration: Arc::new(Mutex::new(Duration::from_millis(10))),
            write_outputs: Arc::new(Mutex::new(true)),
            concurrency: Arc::new(Mutex::new(Concurrency::default())),
        }
    }

    /// Set the simulated encode duration.
    pub fn set_encode_duration(&self, duration: Duration) {
        *lock(&self.duration) = duration;
    }

    /// Whether successful encodes create the output file.
    pub fn set_write_outputs(&self, write: bool) {
        *lock(&self.write_outputs) = write;
    }

    /// Make every encode of `input` exit non-zero with `stderr` as diagnostics.
    pub fn fail_path(&self, input: impl AsRef<Path>, stderr: impl Into<String>) {
        lock(&self.failures).insert(input.as_ref().to_path_buf(), stderr.into());
    }

    /// Get all recorded encodes.
    pub fn recorded_encodes(&self) -> Vec<RecordedEncode> {
        lock(&self.encodes).clone()
    }

    /// Get the number of encodes performed.
    pub fn encode_count(&self) -> usize {
        lock(&self.encodes).len()
    }

    /// Input paths in the order their encodes finished.
    pub fn encoded_inputs(&self) -> Vec<PathBuf> {
        lock(&self.encodes)
            .iter()
            .map(|r| r.job.input_path.clone())
            .collect()
    }

    /// Number of encodes recorded for one input.
    pub fn encodes_for(&self, input: impl AsRef<Path>) -> usize {
        lock(&self.encodes)
            .iter()
            .filter(|r| r.job.input_path == input.as_ref())
            .count()
    }

    /// Highest number of simultaneous encodes seen for one input.
    pub fn max_concurrent_for(&self, input: impl AsRef<Path>) -> usize {
        lock(&self.concurrency)
            .max_by_path
            .get(input.as_ref())
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of simultaneous encodes seen overall.
    pub fn max_concurrent(&self) -> usize {
        lock(&self.concurrency).max_total
    }

    /// Clear recorded encodes.
    pub fn clear_recorded(&self) {
        lock(&self.encodes).clear();
    }

    fn enter(&self, input: &Path) {
        let mut c = lock(&self.concurrency);
        c.active_total += 1;
        c.max_total = c.max_total.max(c.active_total);
        let active = {
            let entry = c.active_by_path.entry(input.to_path_buf()).or_insert(0);
            *entry += 1;
            *entry
        };
        let max = c.max_by_path.entry(input.to_path_buf()).or_insert(0);
        *max = (*max).max(active);
    }

    fn exit(&self, input: &Path) {
        let mut c = lock(&self.concurrency);
        c.active_total = c.active_total.saturating_sub(1);
        if let Some(active) = c.active_by_path.get_mut(input) {
            *active = active.saturating_sub(1);
        }
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn encode(&self, job: &TranscodeJob) -> Result<TranscodeResult, EncoderError> {
        self.enter(&job.input_path);

        let duration = *lock(&self.duration);
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }

        let failure = lock(&self.failures).get(&job.input_path).cloned();
        let output_path = job.output_path();

        let result = match failure {
            Some(stderr) => Err(EncoderError::encode_failed(Some(1), stderr)),
            None => {
                let write = *lock(&self.write_outputs);
                if write {
                    tokio::fs::write(&output_path, b"").await?;
                }
                Ok(TranscodeResult {
                    job_id: job.job_id.clone(),
                    output_path,
                    duration_ms: duration.as_millis() as u64,
                    output_size_bytes: write.then_some(0),
                })
            }
        };

        lock(&self.encodes).push(RecordedEncode {
            job: job.clone(),
            success: result.is_ok(),
        });
        self.exit(&job.input_path);

        result
    }

    async fn validate(&self) -> Result<String, EncoderError> {
        Ok("mock encoder".to_string())
    }
}
