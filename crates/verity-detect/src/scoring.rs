//! Rule-based scoring: an ordered bucket table over the signal vector.
//!
//! The calibration lives in data, not code. Each signal carries an ordered
//! list of `(predicate, delta)` buckets; the first matching bucket applies
//! and the deltas sum onto a neutral baseline. Thresholds are re-tuned from
//! test footage without touching extractor logic.

use serde::{Deserialize, Serialize};
use verity_models::{EngineScore, Signal, SignalVector};

use crate::error::{DetectError, DetectResult};

/// Name the primary engine reports in scores and diagnostics.
pub const PRIMARY_ENGINE: &str = "signal";

/// Bucket predicate. Boundary semantics are fixed per variant: `below` is
/// a strict `<`, `at_least` is `>=`. A value exactly at a bound therefore
/// matches `at_least` and not `below`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches values strictly below the bound.
    Below(f64),
    /// Matches values at or above the bound.
    AtLeast(f64),
}

impl Predicate {
    /// Check whether a value falls in this bucket.
    pub fn matches(&self, value: f64) -> bool {
        match self {
            Predicate::Below(bound) => value < *bound,
            Predicate::AtLeast(bound) => value >= *bound,
        }
    }

    fn bound(&self) -> f64 {
        match self {
            Predicate::Below(bound) | Predicate::AtLeast(bound) => *bound,
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Below(bound) => write!(f, "< {bound}"),
            Predicate::AtLeast(bound) => write!(f, ">= {bound}"),
        }
    }
}

/// One calibrated bucket: when the predicate matches, the delta applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Value range this bucket covers.
    pub when: Predicate,
    /// Score adjustment, positive toward AI-likely.
    pub delta: i32,
}

/// Ordered buckets for one signal. Evaluation is first-match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRule {
    /// Signal this rule consults.
    pub signal: Signal,
    /// Ordered buckets; the first match applies, later ones are skipped.
    pub buckets: Vec<Bucket>,
}

/// The whole calibration: baseline plus per-signal rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTable {
    /// Starting score before any bucket applies (50 = uncertain).
    pub baseline: i32,
    /// Per-signal bucket rules. Rules for different signals are independent
    /// and all contribute; buckets within one rule are first-match.
    pub rules: Vec<SignalRule>,
}

impl Default for ScoringTable {
    fn default() -> Self {
        default_table()
    }
}

impl ScoringTable {
    /// Load a table from JSON calibration data.
    pub fn from_json(raw: &str) -> DetectResult<Self> {
        let table: Self = serde_json::from_str(raw)?;
        table.validate()?;
        Ok(table)
    }

    /// Validate table shape. Fatal at startup, never per-call.
    pub fn validate(&self) -> DetectResult<()> {
        if !(0..=100).contains(&self.baseline) {
            return Err(DetectError::invalid_config("baseline must be in [0,100]"));
        }
        if self.rules.is_empty() {
            return Err(DetectError::invalid_config("scoring table has no rules"));
        }
        for rule in &self.rules {
            if rule.buckets.is_empty() {
                return Err(DetectError::invalid_config(format!(
                    "signal {} has no buckets",
                    rule.signal
                )));
            }
            for bucket in &rule.buckets {
                if !bucket.when.bound().is_finite() {
                    return Err(DetectError::invalid_config(format!(
                        "signal {} has a non-finite bucket bound",
                        rule.signal
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Applies the bucket table to an aggregated signal vector.
pub struct ScoringEngine {
    table: ScoringTable,
}

impl ScoringEngine {
    /// Create an engine from a validated table.
    pub fn new(table: ScoringTable) -> DetectResult<Self> {
        table.validate()?;
        Ok(Self { table })
    }

    /// Score a signal vector.
    ///
    /// Always available once a non-empty vector exists. An empty vector is
    /// a caller contract violation and raises
    /// [`DetectError::EmptySignalVector`] instead of silently scoring 50.
    pub fn score(&self, signals: &SignalVector) -> DetectResult<EngineScore> {
        if signals.is_empty() {
            return Err(DetectError::EmptySignalVector);
        }

        let mut total = self.table.baseline;
        let mut applied = Vec::new();

        for rule in &self.table.rules {
            let Some(value) = signals.get(rule.signal) else {
                continue;
            };
            if let Some(bucket) = rule.buckets.iter().find(|b| b.when.matches(value)) {
                total += bucket.delta;
                applied.push(format!(
                    "{}={:.4} {} => {:+}",
                    rule.signal, value, bucket.when, bucket.delta
                ));
            }
        }

        let clamped = total.clamp(0, 100) as u8;
        let diagnostic = if applied.is_empty() {
            format!("baseline {} with no bucket applied", self.table.baseline)
        } else {
            applied.join("; ")
        };

        Ok(EngineScore::scored(PRIMARY_ENGINE, clamped, diagnostic))
    }
}

/// Default calibration.
///
/// Carried over from production tuning of the signal detector, extended
/// with buckets for the newer spatial and temporal signals. Scales:
/// noise and texture values follow the Laplacian-variance scale,
/// edge density is the 0-255 binary-map mean, entropy is in nats
/// (max ln 36 ~ 3.58), ratios and saturation are unitless.
pub fn default_table() -> ScoringTable {
    use Predicate::{AtLeast, Below};

    let rule = |signal: Signal, buckets: Vec<Bucket>| SignalRule { signal, buckets };
    let bucket = |when: Predicate, delta: i32| Bucket { when, delta };

    ScoringTable {
        baseline: 50,
        rules: vec![
            rule(
                Signal::Noise,
                vec![
                    bucket(Below(45.0), 12),
                    bucket(Below(60.0), 4),
                    bucket(AtLeast(500.0), -12),
                ],
            ),
            rule(
                Signal::FrequencyRatio,
                vec![bucket(Below(0.60), 10), bucket(AtLeast(0.80), -10)],
            ),
            rule(
                Signal::EdgeDensity,
                vec![bucket(Below(10.0), 8), bucket(AtLeast(30.0), -8)],
            ),
            rule(
                Signal::BlockArtifactRatio,
                vec![bucket(AtLeast(2.5), 12), bucket(AtLeast(1.5), 6)],
            ),
            rule(
                Signal::GradientOrientationEntropy,
                vec![bucket(Below(2.0), 8), bucket(AtLeast(3.2), -4)],
            ),
            rule(
                Signal::LocalTextureEntropy,
                vec![bucket(Below(5.0), 6), bucket(AtLeast(50.0), -4)],
            ),
            rule(
                Signal::ColorNoiseCorrelation,
                vec![bucket(AtLeast(0.6), 8)],
            ),
            rule(Signal::Saturation, vec![bucket(AtLeast(0.65), 4)]),
            rule(Signal::Motion, vec![bucket(Below(2.0), 10)]),
            rule(Signal::MotionVariance, vec![bucket(Below(0.5), 10)]),
            rule(
                Signal::HistogramJitter,
                vec![bucket(Below(0.01), 10), bucket(AtLeast(0.05), -10)],
            ),
            rule(Signal::FlowRegularity, vec![bucket(Below(0.05), 8)]),
            rule(Signal::TemporalFlicker, vec![bucket(AtLeast(2.0), 6)]),
            rule(Signal::ResidualConsistency, vec![bucket(Below(0.01), 8)]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_vector(value: f64) -> SignalVector {
        Signal::ALL.into_iter().map(|s| (s, value)).collect()
    }

    #[test]
    fn test_empty_vector_raises() {
        let engine = ScoringEngine::new(ScoringTable::default()).unwrap();
        assert!(matches!(
            engine.score(&SignalVector::new()),
            Err(DetectError::EmptySignalVector)
        ));
    }

    #[test]
    fn test_score_is_always_clamped() {
        let engine = ScoringEngine::new(ScoringTable::default()).unwrap();
        for value in [-1e9, 0.0, 0.5, 1.0, 10.0, 100.0, 1e9] {
            let score = engine.score(&full_vector(value)).unwrap();
            assert!(score.value <= 100);
            assert!(score.available);
        }
    }

    #[test]
    fn test_first_matching_bucket_wins() {
        let table = ScoringTable {
            baseline: 50,
            rules: vec![SignalRule {
                signal: Signal::Noise,
                buckets: vec![
                    Bucket {
                        when: Predicate::Below(45.0),
                        delta: 12,
                    },
                    Bucket {
                        when: Predicate::Below(60.0),
                        delta: 4,
                    },
                ],
            }],
        };
        let engine = ScoringEngine::new(table).unwrap();

        let low: SignalVector = [(Signal::Noise, 10.0)].into_iter().collect();
        assert_eq!(engine.score(&low).unwrap().value, 62);

        let mid: SignalVector = [(Signal::Noise, 50.0)].into_iter().collect();
        assert_eq!(engine.score(&mid).unwrap().value, 54);

        let high: SignalVector = [(Signal::Noise, 80.0)].into_iter().collect();
        assert_eq!(engine.score(&high).unwrap().value, 50);
    }

    #[test]
    fn test_boundary_value_matches_at_least_not_below() {
        assert!(!Predicate::Below(45.0).matches(45.0));
        assert!(Predicate::AtLeast(45.0).matches(45.0));
        assert!(Predicate::Below(45.0).matches(44.999));
    }

    #[test]
    fn test_uniform_clip_vector_lands_in_ai_band() {
        // The aggregated vector a uniform gray clip produces: no noise, no
        // frequency content, no motion.
        let mut vector = full_vector(0.0);
        vector.insert(Signal::ColorNoiseCorrelation, 0.0);
        let engine = ScoringEngine::new(ScoringTable::default()).unwrap();
        let score = engine.score(&vector).unwrap();
        assert!(score.value >= 70, "score was {}", score.value);
    }

    #[test]
    fn test_noisy_clip_vector_lands_below_ai_band() {
        // Representative aggregates for injected per-pixel noise with real
        // frame-to-frame change.
        let vector: SignalVector = [
            (Signal::Noise, 8000.0),
            (Signal::FrequencyRatio, 0.9),
            (Signal::EdgeDensity, 120.0),
            (Signal::BlockArtifactRatio, 1.0),
            (Signal::GradientOrientationEntropy, 3.5),
            (Signal::LocalTextureEntropy, 80.0),
            (Signal::ColorNoiseCorrelation, 0.95),
            (Signal::Saturation, 0.4),
            (Signal::Motion, 60.0),
            (Signal::MotionVariance, 0.2),
            (Signal::HistogramJitter, 0.03),
            (Signal::FlowRegularity, 4.0),
            (Signal::TemporalFlicker, 0.1),
            (Signal::ResidualConsistency, 900.0),
        ]
        .into_iter()
        .collect();
        let engine = ScoringEngine::new(ScoringTable::default()).unwrap();
        let score = engine.score(&vector).unwrap();
        assert!(score.value < 70, "score was {}", score.value);
    }

    #[test]
    fn test_diagnostic_names_applied_buckets() {
        let engine = ScoringEngine::new(ScoringTable::default()).unwrap();
        let vector: SignalVector = [(Signal::Noise, 10.0)].into_iter().collect();
        let score = engine.score(&vector).unwrap();
        assert!(score.diagnostic.contains("noise"));
        assert!(score.diagnostic.contains("+12"));
    }

    #[test]
    fn test_table_json_round_trip() {
        let table = default_table();
        let json = serde_json::to_string(&table).unwrap();
        let back = ScoringTable::from_json(&json).unwrap();
        assert_eq!(table, back);
    }

    #[test]
    fn test_invalid_table_rejected() {
        let empty = ScoringTable {
            baseline: 50,
            rules: vec![],
        };
        assert!(ScoringEngine::new(empty).is_err());

        let no_buckets = ScoringTable {
            baseline: 50,
            rules: vec![SignalRule {
                signal: Signal::Noise,
                buckets: vec![],
            }],
        };
        assert!(ScoringEngine::new(no_buckets).is_err());
    }
}
