//! Inter-frame (temporal) signal extraction.
//!
//! Pairwise signals run over consecutive sampled frames; window signals run
//! over the last [`WINDOW`] frames of the clip. A clip with fewer frames
//! than a signal requires (2 for pairwise, 3 for window signals) yields the
//! zero-value `TemporalFeatures` defaults here; the aggregator checks the
//! same minimums and leaves those signals out of the scored vector, so an
//! unmeasured signal never reads as evidence in either direction.

use ndarray::Array2;

use crate::sampler::FrameBuffer;

/// Rolling window length for flicker and residual-consistency analysis.
pub const WINDOW: usize = 10;

/// Frames required before pairwise signals are computed.
pub const MIN_PAIRWISE_FRAMES: usize = 2;

/// Frames required before window signals are computed.
pub const MIN_WINDOW_FRAMES: usize = 3;

/// Grid cell size for the dense block flow field.
const FLOW_BLOCK: usize = 16;

/// All temporal signals for one clip.
#[derive(Debug, Clone, Default)]
pub struct TemporalFeatures {
    /// Mean absolute pixel difference per consecutive pair.
    pub motion: Vec<f64>,
    /// L1 distance between consecutive normalized 64-bin histograms.
    pub histogram_jitter: Vec<f64>,
    /// Spatial variance of the flow magnitude field per consecutive pair.
    pub flow_regularity: Vec<f64>,
    /// Coefficient of variation of the per-pixel temporal std map.
    pub temporal_flicker: f64,
    /// Variance of the per-frame-difference variance over the window.
    pub residual_consistency: f64,
}

/// Extract every temporal signal from a sampled clip.
pub fn extract(buffer: &FrameBuffer) -> TemporalFeatures {
    let frames = &buffer.frames;
    if frames.len() < MIN_PAIRWISE_FRAMES {
        return TemporalFeatures::default();
    }

    let mut features = TemporalFeatures::default();
    for pair in frames.windows(2) {
        features
            .motion
            .push(mean_abs_diff(&pair[0].gray, &pair[1].gray));
        features
            .histogram_jitter
            .push(histogram_distance(&pair[0].gray, &pair[1].gray));
        features
            .flow_regularity
            .push(flow_magnitude_variance(&pair[0].gray, &pair[1].gray));
    }

    if frames.len() >= MIN_WINDOW_FRAMES {
        let window: Vec<&Array2<f32>> = frames
            .iter()
            .rev()
            .take(WINDOW)
            .rev()
            .map(|f| &f.gray)
            .collect();
        features.temporal_flicker = flicker_coefficient(&window);
        features.residual_consistency = residual_variance(&window);
    }

    features
}

/// Mean absolute pixel difference between two grayscale frames.
pub fn mean_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f64 {
    let n = a.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y).abs() as f64)
        .sum::<f64>()
        / n
}

fn histogram64(gray: &Array2<f32>) -> [f64; 64] {
    let mut histogram = [0.0f64; 64];
    for &v in gray.iter() {
        let bin = ((v / 4.0) as usize).min(63);
        histogram[bin] += 1.0;
    }
    let total: f64 = histogram.iter().sum::<f64>() + 1e-10;
    for bin in histogram.iter_mut() {
        *bin /= total;
    }
    histogram
}

/// Sum of absolute differences between the normalized 64-bin histograms of
/// two frames.
pub fn histogram_distance(a: &Array2<f32>, b: &Array2<f32>) -> f64 {
    let (ha, hb) = (histogram64(a), histogram64(b));
    ha.iter().zip(hb.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Spatial variance of the dense flow magnitude field between two frames.
///
/// The flow field is a block Lucas-Kanade estimate on a [`FLOW_BLOCK`] grid:
/// per block, spatial derivatives of the previous frame and the temporal
/// derivative solve the 2x2 normal equations for one flow vector. Low
/// variance of the magnitudes means suspiciously uniform motion with no
/// parallax.
pub fn flow_magnitude_variance(prev: &Array2<f32>, next: &Array2<f32>) -> f64 {
    let (h, w) = prev.dim();
    let (blocks_y, blocks_x) = (h / FLOW_BLOCK, w / FLOW_BLOCK);
    if blocks_y * blocks_x < 2 {
        return 0.0;
    }

    let mut magnitudes = Vec::with_capacity(blocks_y * blocks_x);
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let (mut sxx, mut sxy, mut syy) = (0.0f64, 0.0f64, 0.0f64);
            let (mut sxt, mut syt) = (0.0f64, 0.0f64);

            let y0 = (by * FLOW_BLOCK).max(1);
            let y1 = ((by + 1) * FLOW_BLOCK).min(h - 1);
            let x0 = (bx * FLOW_BLOCK).max(1);
            let x1 = ((bx + 1) * FLOW_BLOCK).min(w - 1);

            for y in y0..y1 {
                for x in x0..x1 {
                    let ix = ((prev[[y, x + 1]] - prev[[y, x - 1]]) * 0.5) as f64;
                    let iy = ((prev[[y + 1, x]] - prev[[y - 1, x]]) * 0.5) as f64;
                    let it = (next[[y, x]] - prev[[y, x]]) as f64;
                    sxx += ix * ix;
                    sxy += ix * iy;
                    syy += iy * iy;
                    sxt += ix * it;
                    syt += iy * it;
                }
            }

            let det = sxx * syy - sxy * sxy;
            let magnitude = if det.abs() > 1e-6 {
                let u = (-syy * sxt + sxy * syt) / det;
                let v = (sxy * sxt - sxx * syt) / det;
                (u * u + v * v).sqrt()
            } else {
                // Textureless block: no reliable flow estimate.
                0.0
            };
            magnitudes.push(magnitude);
        }
    }

    let n = magnitudes.len() as f64;
    let mean = magnitudes.iter().sum::<f64>() / n;
    magnitudes.iter().map(|m| (m - mean) * (m - mean)).sum::<f64>() / n
}

/// Coefficient of variation (std over mean) of the per-pixel temporal std
/// map across the window. Captures spatially-incoherent flicker.
fn flicker_coefficient(window: &[&Array2<f32>]) -> f64 {
    if window.len() < MIN_WINDOW_FRAMES {
        return 0.0;
    }

    let (h, w) = window[0].dim();
    let t = window.len() as f64;
    let mut std_map = Vec::with_capacity(h * w);

    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f64;
            let mut sum_sq = 0.0f64;
            for frame in window {
                let v = frame[[y, x]] as f64;
                sum += v;
                sum_sq += v * v;
            }
            let mean = sum / t;
            std_map.push((sum_sq / t - mean * mean).max(0.0).sqrt());
        }
    }

    let n = std_map.len() as f64;
    let mean = std_map.iter().sum::<f64>() / n;
    if mean < 1e-10 {
        return 0.0;
    }
    let variance = std_map.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// Variance of the per-frame-difference variance over the window. Very low
/// values mean unnaturally regular frame-to-frame change.
fn residual_variance(window: &[&Array2<f32>]) -> f64 {
    if window.len() < MIN_WINDOW_FRAMES {
        return 0.0;
    }

    let mut diff_variances = Vec::with_capacity(window.len() - 1);
    for pair in window.windows(2) {
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let n = pair[0].len() as f64;
        for (&a, &b) in pair[0].iter().zip(pair[1].iter()) {
            let d = (b - a) as f64;
            sum += d;
            sum_sq += d * d;
        }
        let mean = sum / n;
        diff_variances.push((sum_sq / n - mean * mean).max(0.0));
    }

    let n = diff_variances.len() as f64;
    let mean = diff_variances.iter().sum::<f64>() / n;
    diff_variances
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / n
}
