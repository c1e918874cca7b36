//! Detection pipeline configuration.
//!
//! One immutable configuration object is passed into the analyzer at
//! construction time; nothing in the pipeline reads ambient globals, so
//! multiple calibrations can coexist in one process.

use serde::{Deserialize, Serialize};
use verity_models::{ActionMap, Thresholds};

use crate::error::{DetectError, DetectResult};
use crate::scoring::ScoringTable;

/// Frame sampling limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Keep one out of every `stride` source frames.
    pub stride: u32,
    /// Stop after this many sampled frames.
    pub max_samples: usize,
    /// Stop after this many seconds of source footage.
    pub max_seconds: f64,
    /// Downscale frames to this width for analysis (aspect preserved).
    pub analysis_width: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        // Every 5th frame, 60 samples max: 300 source frames at most,
        // 10 seconds at 30fps.
        Self {
            stride: 5,
            max_samples: 60,
            max_seconds: 10.0,
            analysis_width: 320,
        }
    }
}

impl SamplingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stride: std::env::var("VERITY_SAMPLE_STRIDE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.stride),
            max_samples: std::env::var("VERITY_MAX_SAMPLES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_samples),
            max_seconds: std::env::var("VERITY_MAX_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_seconds),
            analysis_width: std::env::var("VERITY_ANALYSIS_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.analysis_width),
        }
    }

    /// Validate sampling limits.
    pub fn validate(&self) -> DetectResult<()> {
        if self.stride == 0 {
            return Err(DetectError::invalid_config("sample stride must be >= 1"));
        }
        if self.max_samples == 0 {
            return Err(DetectError::invalid_config("max_samples must be >= 1"));
        }
        if self.max_seconds <= 0.0 {
            return Err(DetectError::invalid_config("max_seconds must be positive"));
        }
        if self.analysis_width < 32 {
            return Err(DetectError::invalid_config("analysis_width must be >= 32"));
        }
        Ok(())
    }
}

/// Full pipeline configuration: sampling, calibration, combination, labeling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Frame sampling limits.
    pub sampling: SamplingConfig,
    /// Scoring bucket table for the primary engine.
    pub table: ScoringTable,
    /// Engine weights: index 0 is the primary engine, the rest apply to
    /// secondary engines in registration order. Missing entries default to
    /// equal weight; weights over the available subset are renormalized at
    /// combination time.
    pub weights: Vec<f64>,
    /// Label thresholds on the authenticity scale.
    pub thresholds: Thresholds,
    /// Verdict-to-action mapping for the certification boundary.
    pub actions: ActionMap,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            table: ScoringTable::default(),
            // 50/50 split between the signal engine and the vision engine.
            weights: vec![0.5, 0.5],
            thresholds: Thresholds::default(),
            actions: ActionMap::default(),
        }
    }
}

impl DetectionConfig {
    /// Create config from environment variables, with an optional JSON
    /// calibration file (`VERITY_CALIBRATION`) overriding the whole object.
    pub fn from_env() -> DetectResult<Self> {
        if let Ok(path) = std::env::var("VERITY_CALIBRATION") {
            let raw = std::fs::read_to_string(&path)?;
            let config: Self = serde_json::from_str(&raw)?;
            config.validate()?;
            return Ok(config);
        }

        let config = Self {
            sampling: SamplingConfig::from_env(),
            thresholds: Thresholds {
                real: std::env::var("VERITY_THRESHOLD_REAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(Thresholds::default().real),
                undetermined: std::env::var("VERITY_THRESHOLD_UNDETERMINED")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(Thresholds::default().undetermined),
            },
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the whole configuration. Fatal at startup, never per-call.
    pub fn validate(&self) -> DetectResult<()> {
        self.sampling.validate()?;
        self.table.validate()?;

        if self.thresholds.real > 100 || self.thresholds.undetermined > 100 {
            return Err(DetectError::invalid_config("thresholds must be <= 100"));
        }
        if self.thresholds.real <= self.thresholds.undetermined {
            return Err(DetectError::invalid_config(
                "real threshold must be greater than undetermined threshold",
            ));
        }

        if self.weights.is_empty() {
            return Err(DetectError::invalid_config("at least one engine weight required"));
        }
        if self.weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DetectError::invalid_config("engine weights must be non-negative"));
        }
        if self.weights.iter().sum::<f64>() <= 0.0 {
            return Err(DetectError::invalid_config("engine weights must not all be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        DetectionConfig::default().validate().unwrap();
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = DetectionConfig {
            thresholds: Thresholds {
                real: 30,
                undetermined: 40,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_stride_rejected() {
        let config = DetectionConfig {
            sampling: SamplingConfig {
                stride: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = DetectionConfig {
            weights: vec![0.5, -0.5],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = DetectionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
