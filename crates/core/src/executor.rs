//! Transcode executor: picks the output root and profile for a classified
//! path, runs the encoder, and reports what happened.
//!
//! Failures never propagate. A failed job is logged with the encoder's
//! diagnostics and returned as [`JobOutcome::Failed`]; partial output is left
//! where the encoder put it and nothing is retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::classifier::MediaKind;
use crate::config::OutputConfig;
use crate::encoder::{
    AudioProfile, EncodeProfile, Encoder, EncoderConfig, EncoderError, TranscodeJob, VideoProfile,
};

/// What became of one attempted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded {
        job_id: String,
        output_path: PathBuf,
    },
    Failed {
        job_id: Option<String>,
        error: String,
    },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

pub struct TranscodeExecutor<E: Encoder> {
    encoder: Arc<E>,
    output: OutputConfig,
    video: VideoProfile,
    audio: AudioProfile,
}

impl<E: Encoder> TranscodeExecutor<E> {
    pub fn new(encoder: Arc<E>, output: OutputConfig, encoder_config: &EncoderConfig) -> Self {
        Self {
            encoder,
            output,
            video: encoder_config.video.clone(),
            audio: encoder_config.audio.clone(),
        }
    }

    pub fn encoder(&self) -> &Arc<E> {
        &self.encoder
    }

    /// Builds the job for `path`, or `None` for kinds that are not transcoded.
    pub fn plan(&self, path: &Path, kind: MediaKind) -> Option<Result<TranscodeJob, EncoderError>> {
        let (output_dir, profile) = match kind {
            MediaKind::Video => (
                self.output.movies_dir.clone(),
                EncodeProfile::Video(self.video.clone()),
            ),
            MediaKind::Audio => (
                self.output.music_dir.clone(),
                EncodeProfile::Audio(self.audio.clone()),
            ),
            MediaKind::Ignored => return None,
        };
        Some(TranscodeJob::new(path, output_dir, profile))
    }

    /// Runs one job to completion and logs the result.
    ///
    /// `kind` must be transcodable; an ignored kind is reported as a failure.
    pub async fn execute(&self, path: &Path, kind: MediaKind) -> JobOutcome {
        let job = match self.plan(path, kind) {
            Some(Ok(job)) => job,
            Some(Err(e)) => return Self::failed(None, path, e),
            None => {
                return JobOutcome::Failed {
                    job_id: None,
                    error: format!("{} is not a transcodable media file", path.display()),
                }
            }
        };

        info!("Converting {}: {}", kind, path.display());

        if let Err(source) = tokio::fs::create_dir_all(&job.output_dir).await {
            let err = EncoderError::OutputDirectoryFailed {
                path: job.output_dir.clone(),
                source,
            };
            return Self::failed(Some(job.job_id), path, err);
        }

        match self.encoder.encode(&job).await {
            Ok(result) => {
                info!(
                    "Successfully converted: {} ({} ms)",
                    result.output_path.display(),
                    result.duration_ms
                );
                JobOutcome::Succeeded {
                    job_id: result.job_id,
                    output_path: result.output_path,
                }
            }
            Err(e) => Self::failed(Some(job.job_id), path, e),
        }
    }

    fn failed(job_id: Option<String>, path: &Path, err: EncoderError) -> JobOutcome {
        match err.diagnostics() {
            Some(stderr) => error!("Error converting {}: {}\n{}", path.display(), err, stderr),
            None => error!("Error converting {}: {}", path.display(), err),
        }
        JobOutcome::Failed {
            job_id,
            error: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEncoder;
    use tempfile::TempDir;

    fn outputs(root: &Path) -> OutputConfig {
        OutputConfig {
            movies_dir: root.join("movies"),
            tv_dir: root.join("tv"),
            music_dir: root.join("music"),
        }
    }

    fn executor(encoder: &MockEncoder, root: &Path) -> TranscodeExecutor<MockEncoder> {
        TranscodeExecutor::new(
            Arc::new(encoder.clone()),
            outputs(root),
            &EncoderConfig::default(),
        )
    }

    #[test]
    fn test_plan_routes_by_kind() {
        let encoder = MockEncoder::new();
        let exec = executor(&encoder, Path::new("/out"));

        let video = exec
            .plan(Path::new("/in/movie.mkv"), MediaKind::Video)
            .unwrap()
            .unwrap();
        assert_eq!(video.output_path(), PathBuf::from("/out/movies/movie.mp4"));
        assert!(matches!(video.profile, EncodeProfile::Video(_)));

        let audio = exec
            .plan(Path::new("/in/track.flac"), MediaKind::Audio)
            .unwrap()
            .unwrap();
        assert_eq!(audio.output_path(), PathBuf::from("/out/music/track.mp3"));
        assert!(matches!(audio.profile, EncodeProfile::Audio(_)));

        assert!(exec
            .plan(Path::new("/in/notes.txt"), MediaKind::Ignored)
            .is_none());
    }

    #[tokio::test]
    async fn test_execute_creates_output_dir_and_succeeds() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        let exec = executor(&encoder, dir.path());

        let outcome = exec
            .execute(Path::new("/in/movie.mkv"), MediaKind::Video)
            .await;

        let expected = dir.path().join("movies").join("movie.mp4");
        match &outcome {
            JobOutcome::Succeeded { output_path, .. } => assert_eq!(output_path, &expected),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(dir.path().join("movies").is_dir());
        assert_eq!(encoder.encode_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_failure_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        encoder.fail_path("/in/corrupt.flac", "Invalid data found when processing input");
        let exec = executor(&encoder, dir.path());

        let outcome = exec
            .execute(Path::new("/in/corrupt.flac"), MediaKind::Audio)
            .await;

        match outcome {
            JobOutcome::Failed { job_id, error } => {
                assert!(job_id.is_some());
                assert!(error.contains("Encoder exited"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_ignored_kind_is_failure_without_encoding() {
        let dir = TempDir::new().unwrap();
        let encoder = MockEncoder::new();
        let exec = executor(&encoder, dir.path());

        let outcome = exec
            .execute(Path::new("/in/notes.txt"), MediaKind::Ignored)
            .await;
        assert!(!outcome.is_success());
        assert_eq!(encoder.encode_count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_output_dir_failure() {
        let dir = TempDir::new().unwrap();
        // A regular file where the movies directory should be.
        std::fs::write(dir.path().join("movies"), b"not a dir").unwrap();
        let encoder = MockEncoder::new();
        let exec = executor(&encoder, dir.path());

        let outcome = exec
            .execute(Path::new("/in/movie.mkv"), MediaKind::Video)
            .await;
        match outcome {
            JobOutcome::Failed { error, .. } => {
                assert!(error.contains("Failed to create output directory"))
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(encoder.encode_count(), 0);
    }
}
