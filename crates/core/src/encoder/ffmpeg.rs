//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use super::config::{AudioProfile, EncoderConfig, VideoProfile};
use super::error::EncoderError;
use super::traits::Encoder;
use super::types::{EncodeProfile, TranscodeJob, TranscodeResult};

/// Lines of non-progress stderr kept for failure reports.
const DIAGNOSTIC_TAIL_LINES: usize = 64;

/// FFmpeg-based encoder implementation.
pub struct FfmpegEncoder {
    config: EncoderConfig,
    progress_re: Option<Regex>,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            progress_re: Regex::new(r"^([a-z0-9_]+)=\s*(.*)$").ok(),
        }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Builds the full argument list for a job.
    ///
    /// Paths are passed through as `OsString`s so names that are not valid
    /// UTF-8 reach ffmpeg byte for byte.
    pub fn build_args(&self, job: &TranscodeJob) -> Vec<OsString> {
        let output_path = job.output_path();
        match &job.profile {
            EncodeProfile::Video(video) => {
                self.build_video_args(&job.input_path, &output_path, video)
            }
            EncodeProfile::Audio(audio) => {
                self.build_audio_args(&job.input_path, &output_path, audio)
            }
        }
    }

    /// Builds ffmpeg arguments for video conversion.
    fn build_video_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        profile: &VideoProfile,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(), // Overwrite output
            "-i".into(),
            input_path.into(),
            "-c:v".into(),
            profile.codec.as_str().into(),
            "-preset".into(),
            profile.preset.as_str().into(),
            "-crf".into(),
            profile.crf.to_string().into(),
            "-c:a".into(),
            profile.audio_codec.as_str().into(),
            "-b:a".into(),
            format!("{}k", profile.audio_bitrate_kbps).into(),
        ];

        if profile.faststart {
            args.extend([OsString::from("-movflags"), OsString::from("+faststart")]);
        }

        self.push_common_tail(&mut args, output_path);
        args
    }

    /// Builds ffmpeg arguments for audio conversion.
    fn build_audio_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        profile: &AudioProfile,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            input_path.into(),
            "-c:a".into(),
            profile.codec.as_str().into(),
            "-b:a".into(),
            format!("{}k", profile.bitrate_kbps).into(),
        ];

        self.push_common_tail(&mut args, output_path);
        args
    }

    /// Log level, machine-readable progress on stderr, extra args, output.
    fn push_common_tail(&self, args: &mut Vec<OsString>, output_path: &Path) {
        args.extend([
            OsString::from("-loglevel"),
            OsString::from(&self.config.log_level),
            OsString::from("-nostats"),
            OsString::from("-progress"),
            OsString::from("pipe:2"),
        ]);
        args.extend(self.config.extra_args.iter().map(OsString::from));
        args.push(output_path.into());
    }

    /// Splits a stderr line into a progress key/value pair, if it is one.
    fn parse_progress_line<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let re = self.progress_re.as_ref()?;
        let caps = re.captures(line)?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encode(&self, job: &TranscodeJob) -> Result<TranscodeResult, EncoderError> {
        let start = Instant::now();
        let output_path = job.output_path();
        let args = self.build_args(job);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncoderError::EncoderNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EncoderError::Io(e)
                }
            })?;

        let mut diagnostics: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);

        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut out_time_secs = 0.0;
            let mut speed: Option<String> = None;

            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Stopped reading output of job {}: {}", job.job_id, e);
                        break;
                    }
                }
                // File names and tags in ffmpeg's output are not always UTF-8.
                let raw = String::from_utf8_lossy(&buf);
                let line = raw.trim_end_matches(['\r', '\n']);

                match self.parse_progress_line(line) {
                    Some(("out_time_us", value)) | Some(("out_time_ms", value)) => {
                        // Both keys carry microseconds.
                        if let Ok(us) = value.parse::<f64>() {
                            out_time_secs = us / 1_000_000.0;
                        }
                    }
                    Some(("speed", value)) => speed = Some(value.to_string()),
                    Some(("progress", state)) => {
                        debug!(
                            "Job {} progress: {:.1}s encoded, speed {} ({})",
                            job.job_id,
                            out_time_secs,
                            speed.as_deref().unwrap_or("n/a"),
                            state
                        );
                    }
                    Some(_) => {}
                    None => {
                        if diagnostics.len() == DIAGNOSTIC_TAIL_LINES {
                            diagnostics.pop_front();
                        }
                        diagnostics.push_back(line.to_string());
                    }
                }
            }
        }

        // Always reap the child, even if reading its output failed.
        let status = child.wait().await?;
        if !status.success() {
            let stderr = diagnostics.into_iter().collect::<Vec<_>>().join("\n");
            return Err(EncoderError::encode_failed(status.code(), stderr));
        }

        let output_size_bytes = tokio::fs::metadata(&output_path).await.ok().map(|m| m.len());

        Ok(TranscodeResult {
            job_id: job.job_id.clone(),
            output_path,
            duration_ms: start.elapsed().as_millis() as u64,
            output_size_bytes,
        })
    }

    async fn validate(&self) -> Result<String, EncoderError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncoderError::EncoderNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EncoderError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EncoderError::encode_failed(
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}
