//! Signal names and the aggregated per-clip signal vector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One named scalar feature extracted from spatial or temporal analysis
/// of the sampled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Variance of a 4-neighbor second-derivative filter response.
    Noise,
    /// Ratio of spectral energy outside the low-frequency disc to total energy.
    FrequencyRatio,
    /// Mean intensity of the binary edge map (0-255 scale).
    EdgeDensity,
    /// Mean ratio of 8x8 DCT border coefficients to interior coefficients.
    BlockArtifactRatio,
    /// Shannon entropy of the 36-bin gradient orientation histogram.
    GradientOrientationEntropy,
    /// Std-dev of per-patch noise across 16x16 tiles.
    LocalTextureEntropy,
    /// 1 - |mean pairwise correlation| of per-channel high-pass residuals.
    ColorNoiseCorrelation,
    /// Mean HSV saturation of the color frame.
    Saturation,
    /// Mean absolute pixel difference between consecutive frames.
    Motion,
    /// Variance of the motion series across the clip.
    MotionVariance,
    /// Mean L1 distance between consecutive normalized 64-bin histograms.
    HistogramJitter,
    /// Mean spatial variance of the dense flow magnitude field.
    FlowRegularity,
    /// Coefficient of variation of the per-pixel temporal std map.
    TemporalFlicker,
    /// Variance of the per-frame-difference variance over the window.
    ResidualConsistency,
}

impl Signal {
    /// Every signal the pipeline produces, in canonical order.
    pub const ALL: [Signal; 14] = [
        Signal::Noise,
        Signal::FrequencyRatio,
        Signal::EdgeDensity,
        Signal::BlockArtifactRatio,
        Signal::GradientOrientationEntropy,
        Signal::LocalTextureEntropy,
        Signal::ColorNoiseCorrelation,
        Signal::Saturation,
        Signal::Motion,
        Signal::MotionVariance,
        Signal::HistogramJitter,
        Signal::FlowRegularity,
        Signal::TemporalFlicker,
        Signal::ResidualConsistency,
    ];

    /// Get string representation of the signal name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Noise => "noise",
            Signal::FrequencyRatio => "frequency_ratio",
            Signal::EdgeDensity => "edge_density",
            Signal::BlockArtifactRatio => "block_artifact_ratio",
            Signal::GradientOrientationEntropy => "gradient_orientation_entropy",
            Signal::LocalTextureEntropy => "local_texture_entropy",
            Signal::ColorNoiseCorrelation => "color_noise_correlation",
            Signal::Saturation => "saturation",
            Signal::Motion => "motion",
            Signal::MotionVariance => "motion_variance",
            Signal::HistogramJitter => "histogram_jitter",
            Signal::FlowRegularity => "flow_regularity",
            Signal::TemporalFlicker => "temporal_flicker",
            Signal::ResidualConsistency => "residual_consistency",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregated signal values for one clip, one scalar per signal.
///
/// Immutable once produced by the aggregator. Values are guaranteed finite:
/// `insert` substitutes 0.0 for NaN or infinite values, so a signal that
/// could not be computed degrades to its documented neutral default instead
/// of poisoning the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalVector {
    values: BTreeMap<Signal, f64>,
}

impl SignalVector {
    /// Create an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a signal value. Non-finite values are replaced with 0.0.
    pub fn insert(&mut self, signal: Signal, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.values.insert(signal, value);
    }

    /// Get a signal value, if present.
    pub fn get(&self, signal: Signal) -> Option<f64> {
        self.values.get(&signal).copied()
    }

    /// Number of signals present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no signal has been recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over (signal, value) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Signal, f64)> + '_ {
        self.values.iter().map(|(s, v)| (*s, *v))
    }
}

impl FromIterator<(Signal, f64)> for SignalVector {
    fn from_iter<I: IntoIterator<Item = (Signal, f64)>>(iter: I) -> Self {
        let mut vector = SignalVector::new();
        for (signal, value) in iter {
            vector.insert(signal, value);
        }
        vector
    }
}
