//! Authenticity labeling via two configurable thresholds.

use verity_models::{Thresholds, Verdict};

use crate::error::{DetectError, DetectResult};

/// Maps an authenticity score to a verdict.
///
/// Boundary semantics: both thresholds are inclusive lower bounds, so an
/// authenticity exactly at `real` labels REAL and exactly at `undetermined`
/// labels UNDETERMINED.
#[derive(Debug, Clone, Copy)]
pub struct Labeler {
    thresholds: Thresholds,
}

impl Labeler {
    /// Create a labeler, validating `real > undetermined`.
    pub fn new(thresholds: Thresholds) -> DetectResult<Self> {
        if thresholds.real > 100 || thresholds.undetermined > 100 {
            return Err(DetectError::invalid_config("thresholds must be <= 100"));
        }
        if thresholds.real <= thresholds.undetermined {
            return Err(DetectError::invalid_config(
                "real threshold must be greater than undetermined threshold",
            ));
        }
        Ok(Self { thresholds })
    }

    /// The thresholds this labeler applies.
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Label an authenticity score (0-100, higher = more likely real).
    pub fn label(&self, authenticity: u8) -> Verdict {
        if authenticity >= self.thresholds.real {
            Verdict::Real
        } else if authenticity >= self.thresholds.undetermined {
            Verdict::Undetermined
        } else {
            Verdict::Ai
        }
    }
}
