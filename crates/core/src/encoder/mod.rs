//! Encoder module: runs the external transcoder for one job at a time.
//!
//! Provides the `Encoder` trait and an FFmpeg implementation with two fixed
//! profiles:
//!
//! - Video: H.264 (CRF 23, `medium`) + AAC 192k in MP4 with `+faststart`
//! - Audio: MP3 (libmp3lame) at 320k
//!
//! The encoder is treated as an opaque collaborator: only its exit status and
//! its diagnostic stream are inspected. Progress lines (`-progress pipe:2`)
//! are parsed for debug logging only.
//!
//! # Example
//!
//! ```ignore
//! use mediawatch_core::encoder::{Encoder, EncodeProfile, FfmpegEncoder, TranscodeJob, VideoProfile};
//!
//! let encoder = FfmpegEncoder::with_defaults();
//! encoder.validate().await?;
//!
//! let job = TranscodeJob::new(
//!     "/input/movie.mkv",
//!     "/output/movies",
//!     EncodeProfile::Video(VideoProfile::default()),
//! )?;
//! let result = encoder.encode(&job).await?;
//! println!("Wrote {} in {} ms", result.output_path.display(), result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::{AudioProfile, EncoderConfig, VideoProfile};
pub use error::EncoderError;
pub use ffmpeg::FfmpegEncoder;
pub use traits::Encoder;
pub use types::{EncodeProfile, TranscodeJob, TranscodeResult};
