//! The uniform scoring engine contract.
//!
//! Every engine in the system (signal-based primary, quick heuristic,
//! hosted vision) returns an [`EngineScore`]. Availability is a first-class
//! field: an engine that failed reports `available: false` and is excluded
//! from combination entirely. Its placeholder value must never be blended
//! into a combined score.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::frame::StillFrame;

/// Result of one scoring engine for one clip.
///
/// `value` is an AI-likelihood score in [0,100]; higher means more likely
/// synthetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineScore {
    /// Name of the engine that produced this score.
    pub engine: String,
    /// AI-likelihood score, 0-100.
    pub value: u8,
    /// False when the engine errored, timed out, or was not configured.
    /// The combiner excludes unavailable engines; `value` is a placeholder.
    pub available: bool,
    /// Human-readable explanation of how the score was reached.
    pub diagnostic: String,
    /// Specific anomalies the engine flagged.
    pub flags: Vec<String>,
}

impl EngineScore {
    /// A successful score.
    pub fn scored(engine: impl Into<String>, value: u8, diagnostic: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            value: value.min(100),
            available: true,
            diagnostic: diagnostic.into(),
            flags: Vec::new(),
        }
    }

    /// An unavailable engine. The neutral placeholder value is carried for
    /// display only and is excluded from combination by the combiner.
    pub fn unavailable(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            value: 50,
            available: false,
            diagnostic: reason.into(),
            flags: Vec::new(),
        }
    }

    /// Attach anomaly flags.
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }
}

/// A secondary scoring engine operating on extracted still frames.
///
/// Implementations must not fail: any internal error maps to an
/// [`EngineScore`] with `available: false`, which the combiner excludes.
#[async_trait]
pub trait ScoreEngine: Send + Sync {
    /// Engine name used in diagnostics and result detail.
    fn name(&self) -> &'static str;

    /// Score the clip represented by the given still frames.
    async fn score(&self, frames: &[StillFrame]) -> EngineScore;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_clamps_value() {
        let score = EngineScore::scored("signal", 200, "clamped");
        assert_eq!(score.value, 100);
        assert!(score.available);
    }

    #[test]
    fn test_unavailable_is_marked() {
        let score = EngineScore::unavailable("vision", "no API key");
        assert!(!score.available);
        assert_eq!(score.value, 50);
        assert_eq!(score.diagnostic, "no API key");
    }

    #[test]
    fn test_flags_round_trip() {
        let score = EngineScore::scored("vision", 80, "ok")
            .with_flags(vec!["melting text".to_string()]);
        let json = serde_json::to_string(&score).unwrap();
        let back: EngineScore = serde_json::from_str(&json).unwrap();
        assert_eq!(score, back);
    }
}
