//! Types for the encoder module.

use std::path::{Path, PathBuf};

use super::config::{AudioProfile, VideoProfile};
use super::error::EncoderError;

/// Target parameters for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeProfile {
    Video(VideoProfile),
    Audio(AudioProfile),
}

impl EncodeProfile {
    /// Extension of the produced file.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Video(_) => VideoProfile::EXTENSION,
            Self::Audio(_) => AudioProfile::EXTENSION,
        }
    }
}

/// One file to transcode. Lives from a successful claim until the encoder exits.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    /// Unique identifier for log correlation.
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub profile: EncodeProfile,
}

impl TranscodeJob {
    /// Builds a job; the output keeps the input's base name with the profile's extension.
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        profile: EncodeProfile,
    ) -> Result<Self, EncoderError> {
        let input_path = input_path.into();
        if input_path.file_stem().is_none() {
            return Err(EncoderError::invalid_job(format!(
                "input has no file name: {}",
                input_path.display()
            )));
        }

        Ok(Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            input_path,
            output_dir: output_dir.into(),
            profile,
        })
    }

    /// `<output_dir>/<input stem>.<ext>`; existing files there are overwritten.
    pub fn output_path(&self) -> PathBuf {
        let stem = self.input_path.file_stem().unwrap_or_default();
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(self.profile.extension());
        self.output_dir.join(name)
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }
}

/// Result of a successful encode.
#[derive(Debug, Clone)]
pub struct TranscodeResult {
    pub job_id: String,
    pub output_path: PathBuf,
    /// Wall-clock time spent in the encoder.
    pub duration_ms: u64,
    /// Size of the output as reported by the filesystem, if readable.
    pub output_size_bytes: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_output_path() {
        let job = TranscodeJob::new(
            "/input/nested/movie.mkv",
            "/output/movies",
            EncodeProfile::Video(VideoProfile::default()),
        )
        .unwrap();
        assert_eq!(job.output_path(), PathBuf::from("/output/movies/movie.mp4"));
    }

    #[test]
    fn test_audio_output_path() {
        let job = TranscodeJob::new(
            "/input/track.flac",
            "/output/music",
            EncodeProfile::Audio(AudioProfile::default()),
        )
        .unwrap();
        assert_eq!(job.output_path(), PathBuf::from("/output/music/track.mp3"));
    }

    #[test]
    fn test_output_path_keeps_inner_dots() {
        let job = TranscodeJob::new(
            "/input/Some.Show.S01E01.1080p.mkv",
            "/output/movies",
            EncodeProfile::Video(VideoProfile::default()),
        )
        .unwrap();
        assert_eq!(
            job.output_path(),
            PathBuf::from("/output/movies/Some.Show.S01E01.1080p.mp4")
        );
    }

    #[test]
    fn test_same_container_input_still_gets_new_file_in_output_dir() {
        let job = TranscodeJob::new(
            "/input/clip.mp4",
            "/output/movies",
            EncodeProfile::Video(VideoProfile::default()),
        )
        .unwrap();
        assert_eq!(job.output_path(), PathBuf::from("/output/movies/clip.mp4"));
    }

    #[test]
    fn test_job_without_file_name_is_rejected() {
        let result = TranscodeJob::new(
            "/",
            "/output/music",
            EncodeProfile::Audio(AudioProfile::default()),
        );
        assert!(matches!(result, Err(EncoderError::InvalidJob { .. })));
    }

    #[test]
    fn test_job_ids_are_unique() {
        let a = TranscodeJob::new("/in/a.mp3", "/out", EncodeProfile::Audio(AudioProfile::default())).unwrap();
        let b = TranscodeJob::new("/in/a.mp3", "/out", EncodeProfile::Audio(AudioProfile::default())).unwrap();
        assert_ne!(a.job_id, b.job_id);
    }
}
