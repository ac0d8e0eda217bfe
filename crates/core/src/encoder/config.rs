//! Configuration for the encoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Additional arguments placed just before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,

    #[serde(default)]
    pub video: VideoProfile,

    #[serde(default)]
    pub audio: AudioProfile,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            log_level: default_log_level(),
            extra_args: Vec::new(),
            video: VideoProfile::default(),
            audio: AudioProfile::default(),
        }
    }
}

impl EncoderConfig {
    /// Creates a new config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ..Default::default()
        }
    }

    /// Sets the ffmpeg log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Parameters for video inputs. Output is always an MP4 container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoProfile {
    #[serde(default = "default_video_codec")]
    pub codec: String,
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Constant rate factor, 0 (lossless) to 51.
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_video_audio_codec")]
    pub audio_codec: String,
    #[serde(default = "default_video_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
    /// Move the moov atom to the front for progressive download.
    #[serde(default = "default_faststart")]
    pub faststart: bool,
}

impl VideoProfile {
    pub const EXTENSION: &'static str = "mp4";
}

impl Default for VideoProfile {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_video_audio_codec(),
            audio_bitrate_kbps: default_video_audio_bitrate(),
            faststart: default_faststart(),
        }
    }
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_video_audio_codec() -> String {
    "aac".to_string()
}

fn default_video_audio_bitrate() -> u32 {
    192
}

fn default_faststart() -> bool {
    true
}

/// Parameters for audio inputs. Output is always MP3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioProfile {
    #[serde(default = "default_audio_codec")]
    pub codec: String,
    #[serde(default = "default_audio_bitrate")]
    pub bitrate_kbps: u32,
}

impl AudioProfile {
    pub const EXTENSION: &'static str = "mp3";
}

impl Default for AudioProfile {
    fn default() -> Self {
        Self {
            codec: default_audio_codec(),
            bitrate_kbps: default_audio_bitrate(),
        }
    }
}

fn default_audio_codec() -> String {
    "libmp3lame".to_string()
}

fn default_audio_bitrate() -> u32 {
    320
}
