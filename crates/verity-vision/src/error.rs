//! Vision client error types.

use thiserror::Error;

pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision engine not configured: {0}")]
    NotConfigured(String),

    #[error("no frames to analyze")]
    NoFrames,

    #[error("rate limited by vision API")]
    RateLimited,

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("frame encoding failed: {0}")]
    Encoding(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, VisionError::RateLimited | VisionError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(VisionError::RateLimited.is_retryable());
        assert!(!VisionError::NoFrames.is_retryable());
        assert!(!VisionError::RequestFailed("500".into()).is_retryable());
        assert!(!VisionError::InvalidResponse("not json".into()).is_retryable());
    }
}
