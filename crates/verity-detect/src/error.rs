//! Error types for the detection pipeline.
//!
//! The taxonomy separates fatal conditions from locally recovered ones:
//! - `CannotDecode` and `InvalidConfig` propagate to the caller.
//! - Insufficient frames for a temporal signal is NOT an error; the signal
//!   is omitted from the aggregated vector and the scorer skips it.
//! - A failed secondary engine is NOT an error; it reports
//!   `available: false` and the combiner excludes it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for detection operations.
pub type DetectResult<T> = Result<T, DetectError>;

/// Errors that can occur during clip analysis.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    /// The file is unreadable, has no video stream, or yields zero decodable
    /// frames. Surfaces as a distinct outcome so callers never confuse
    /// "could not analyze" with a borderline score.
    #[error("cannot decode video {path}: {reason}")]
    CannotDecode { path: PathBuf, reason: String },

    /// Scoring was invoked with an empty signal vector. Caller contract
    /// violation: an undecodable clip must be rejected before scoring.
    #[error("scoring requires a non-empty signal vector")]
    EmptySignalVector,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl DetectError {
    /// Create a decode failure error.
    pub fn cannot_decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CannotDecode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
