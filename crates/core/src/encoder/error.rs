//! Error types for the encoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the external encoder.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    EncoderNotFound { path: PathBuf },

    /// The job cannot be turned into an encoder invocation.
    #[error("Invalid transcode job: {reason}")]
    InvalidJob { reason: String },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoder exited with a non-zero status.
    #[error("Encoder exited with code {code:?}")]
    EncodeFailed {
        code: Option<i32>,
        /// Tail of the encoder's diagnostic output.
        stderr: String,
    },

    /// I/O error while talking to the encoder process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncoderError {
    /// Creates a new encode failed error.
    pub fn encode_failed(code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::EncodeFailed {
            code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new invalid job error.
    pub fn invalid_job(reason: impl Into<String>) -> Self {
        Self::InvalidJob {
            reason: reason.into(),
        }
    }

    /// Diagnostic text captured from the encoder, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::EncodeFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_failed_display_and_diagnostics() {
        let err = EncoderError::encode_failed(Some(1), "Invalid data found when processing input");
        assert_eq!(err.to_string(), "Encoder exited with code Some(1)");
        assert_eq!(
            err.diagnostics(),
            Some("Invalid data found when processing input")
        );
    }

    #[test]
    fn test_no_diagnostics_for_other_errors() {
        let err = EncoderError::EncoderNotFound {
            path: PathBuf::from("/nope/ffmpeg"),
        };
        assert!(err.diagnostics().is_none());
        assert!(EncoderError::encode_failed(None, "").diagnostics().is_none());
    }
}
