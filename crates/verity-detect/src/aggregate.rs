//! Signal aggregation: reduce per-frame and per-pair series to one scalar
//! per signal for the whole clip.
//!
//! Pure function of the extractor outputs. Mean for every signal, variance
//! additionally for motion. No I/O, no state.
//!
//! Temporal signals that cannot be measured on a short clip are left out of
//! the vector entirely; the scorer skips absent signals, so a clip too
//! short to measure is never scored as if it had measured still or flat.

use verity_models::{Signal, SignalVector};

use crate::sampler::FrameBuffer;
use crate::spatial;
use crate::temporal;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Run both extractors over a sampled clip and aggregate into one
/// [`SignalVector`].
///
/// An empty buffer yields an empty vector; the sampler never hands one out,
/// and the scorer rejects it if a caller does.
pub fn aggregate(buffer: &FrameBuffer) -> SignalVector {
    let mut vector = SignalVector::new();
    if buffer.is_empty() {
        return vector;
    }

    let spatial: Vec<spatial::SpatialFeatures> =
        buffer.frames.iter().map(spatial::extract).collect();

    let series = |f: fn(&spatial::SpatialFeatures) -> f64| -> Vec<f64> {
        spatial.iter().map(f).collect()
    };

    vector.insert(Signal::Noise, mean(&series(|s| s.noise)));
    vector.insert(Signal::FrequencyRatio, mean(&series(|s| s.frequency_ratio)));
    vector.insert(Signal::EdgeDensity, mean(&series(|s| s.edge_density)));
    vector.insert(
        Signal::BlockArtifactRatio,
        mean(&series(|s| s.block_artifact_ratio)),
    );
    vector.insert(
        Signal::GradientOrientationEntropy,
        mean(&series(|s| s.gradient_orientation_entropy)),
    );
    vector.insert(
        Signal::LocalTextureEntropy,
        mean(&series(|s| s.local_texture_entropy)),
    );
    vector.insert(
        Signal::ColorNoiseCorrelation,
        mean(&series(|s| s.color_noise_correlation)),
    );
    vector.insert(Signal::Saturation, mean(&series(|s| s.saturation)));

    let temporal = temporal::extract(buffer);
    let frames = buffer.len();

    if frames >= temporal::MIN_PAIRWISE_FRAMES {
        vector.insert(Signal::Motion, mean(&temporal.motion));
        vector.insert(Signal::HistogramJitter, mean(&temporal.histogram_jitter));
        vector.insert(Signal::FlowRegularity, mean(&temporal.flow_regularity));
    }

    // Variance-of-series and window signals need more than one measurement;
    // with fewer frames they would read 0.0 and mimic a perfectly static
    // clip.
    if frames >= temporal::MIN_WINDOW_FRAMES {
        vector.insert(Signal::MotionVariance, variance(&temporal.motion));
        vector.insert(Signal::TemporalFlicker, temporal.temporal_flicker);
        vector.insert(Signal::ResidualConsistency, temporal.residual_consistency);
    }

    vector
}
