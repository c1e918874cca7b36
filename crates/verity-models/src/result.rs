//! Per-clip analysis result and label thresholds.

use serde::{Deserialize, Serialize};

use crate::engine::EngineScore;
use crate::signal::SignalVector;
use crate::verdict::Verdict;

/// Label thresholds on the authenticity scale (0-100, higher = more real).
///
/// `authenticity >= real` labels REAL, `undetermined <= authenticity < real`
/// labels UNDETERMINED, anything below labels AI. Validity (`real` strictly
/// greater than `undetermined`) is enforced by the labeler constructor, not
/// assumed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum authenticity for a REAL verdict.
    pub real: u8,
    /// Minimum authenticity for an UNDETERMINED verdict.
    pub undetermined: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        // Calibration carried over from production tuning: real videos in the
        // low 60s need headroom, and a narrow undetermined band keeps the
        // review queue small.
        Self {
            real: 50,
            undetermined: 35,
        }
    }
}

/// Final result of one analysis call.
///
/// Constructed once per clip and never mutated. Contains the full breakdown
/// so callers can audit how the verdict was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    /// Combined AI-likelihood score, 0-100 (higher = more likely synthetic).
    pub ai_score: u8,
    /// Authenticity score, `100 - ai_score`.
    pub authenticity: u8,
    /// Verdict derived from the authenticity score.
    pub label: Verdict,
    /// Aggregated signal vector the primary engine scored.
    pub signals: SignalVector,
    /// Every contributing engine score, primary first.
    pub engine_scores: Vec<EngineScore>,
    /// Thresholds used to derive the label.
    pub thresholds: Thresholds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert!(t.real > t.undetermined);
    }

    #[test]
    fn test_result_round_trips_through_json() {
        let result = CombinedResult {
            ai_score: 62,
            authenticity: 38,
            label: Verdict::Undetermined,
            signals: [(Signal::Noise, 12.0)].into_iter().collect(),
            engine_scores: vec![EngineScore::scored("signal", 62, "test")],
            thresholds: Thresholds::default(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: CombinedResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
