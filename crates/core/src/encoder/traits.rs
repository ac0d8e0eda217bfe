//! Trait definitions for the encoder module.

use async_trait::async_trait;

use super::error::EncoderError;
use super::types::{TranscodeJob, TranscodeResult};

/// An external encoder that turns one input file into one output file.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Runs the job to completion. No timeout is applied.
    ///
    /// The output directory must already exist.
    async fn encode(&self, job: &TranscodeJob) -> Result<TranscodeResult, EncoderError>;

    /// Checks that the encoder is usable, returning a version string.
    async fn validate(&self) -> Result<String, EncoderError>;
}
