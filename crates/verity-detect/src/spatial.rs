//! Single-frame (spatial) signal extraction.
//!
//! Every function here is pure and order-independent: one frame in, one
//! float out. Frames too small for a given filter yield the signal's
//! neutral default of 0.0 rather than an error.

use ndarray::{Array2, Array3, ArrayView2, s};
use num_complex::Complex32;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::sampler::Frame;

/// Gradient magnitude above which a pixel counts as an edge.
const EDGE_THRESHOLD: f32 = 120.0;

/// Gradient magnitude below which orientation is considered unreliable.
const ORIENTATION_MIN_MAGNITUDE: f32 = 1.0;

/// Side length of the tiles used for local texture analysis.
const TEXTURE_PATCH: usize = 16;

/// All spatial signals for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialFeatures {
    pub noise: f64,
    pub frequency_ratio: f64,
    pub edge_density: f64,
    pub block_artifact_ratio: f64,
    pub gradient_orientation_entropy: f64,
    pub local_texture_entropy: f64,
    pub color_noise_correlation: f64,
    pub saturation: f64,
}

/// Extract every spatial signal from one frame.
pub fn extract(frame: &Frame) -> SpatialFeatures {
    SpatialFeatures {
        noise: noise(&frame.gray),
        frequency_ratio: frequency_ratio(&frame.gray),
        edge_density: edge_density(&frame.gray),
        block_artifact_ratio: block_artifact_ratio(&frame.gray),
        gradient_orientation_entropy: gradient_orientation_entropy(&frame.gray),
        local_texture_entropy: local_texture_entropy(&frame.gray),
        color_noise_correlation: color_noise_correlation(&frame.rgb),
        saturation: saturation(&frame.rgb),
    }
}

/// Sensor-noise estimate: variance of the 4-neighbor Laplacian response.
/// Real cameras have more.
pub fn noise(gray: &Array2<f32>) -> f64 {
    laplacian_variance(gray.view())
}

fn laplacian_variance(gray: ArrayView2<f32>) -> f64 {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let n = ((h - 2) * (w - 2)) as f64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let v = (4.0 * gray[[y, x]]
                - gray[[y - 1, x]]
                - gray[[y + 1, x]]
                - gray[[y, x - 1]]
                - gray[[y, x + 1]]) as f64;
            sum += v;
            sum_sq += v * v;
        }
    }

    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Ratio of 2-D spectral energy outside the centered low-frequency disc
/// (radius `min(h,w)/4`) to total energy. Generated frames often lack
/// high-frequency detail, pulling this ratio down.
pub fn frequency_ratio(gray: &Array2<f32>) -> f64 {
    let (h, w) = gray.dim();
    if h < 8 || w < 8 {
        return 0.0;
    }

    let mut planner = FftPlanner::<f32>::new();
    let row_fft = planner.plan_fft_forward(w);
    let col_fft = planner.plan_fft_forward(h);

    let mut grid: Vec<Complex32> = gray.iter().map(|&v| Complex32::new(v, 0.0)).collect();

    for row in grid.chunks_exact_mut(w) {
        row_fft.process(row);
    }
    let mut column = vec![Complex32::default(); h];
    for x in 0..w {
        for y in 0..h {
            column[y] = grid[y * w + x];
        }
        col_fft.process(&mut column);
        for y in 0..h {
            grid[y * w + x] = column[y];
        }
    }

    let (cy, cx) = (h / 2, w / 2);
    let radius = (h.min(w) / 4) as i64;
    let r2 = radius * radius;

    let mut total = 0.0f64;
    let mut high = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            // Signed wrap-around distance from the DC term, i.e. the
            // coordinates the bin would have in a center-shifted spectrum.
            let sy = ((y + cy) % h) as i64 - cy as i64;
            let sx = ((x + cx) % w) as i64 - cx as i64;
            let magnitude = grid[y * w + x].norm() as f64;
            total += magnitude;
            if sy * sy + sx * sx > r2 {
                high += magnitude;
            }
        }
    }

    high / (total + 1e-10)
}

/// Sobel derivatives over the frame interior.
fn sobel(gray: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = gray.dim();
    let mut gx = Array2::<f32>::zeros((h, w));
    let mut gy = Array2::<f32>::zeros((h, w));
    if h < 3 || w < 3 {
        return (gx, gy);
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            gx[[y, x]] = (gray[[y - 1, x + 1]] + 2.0 * gray[[y, x + 1]] + gray[[y + 1, x + 1]])
                - (gray[[y - 1, x - 1]] + 2.0 * gray[[y, x - 1]] + gray[[y + 1, x - 1]]);
            gy[[y, x]] = (gray[[y + 1, x - 1]] + 2.0 * gray[[y + 1, x]] + gray[[y + 1, x + 1]])
                - (gray[[y - 1, x - 1]] + 2.0 * gray[[y - 1, x]] + gray[[y - 1, x + 1]]);
        }
    }
    (gx, gy)
}

/// Mean intensity of the binary edge map on a 0-255 scale (fraction of
/// edge pixels times 255). Real video has sharper, more varied edges.
pub fn edge_density(gray: &Array2<f32>) -> f64 {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let (gx, gy) = sobel(gray);
    let mut edges = 0usize;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let magnitude = (gx[[y, x]] * gx[[y, x]] + gy[[y, x]] * gy[[y, x]]).sqrt();
            if magnitude > EDGE_THRESHOLD {
                edges += 1;
            }
        }
    }
    255.0 * edges as f64 / ((h - 2) * (w - 2)) as f64
}

/// 8x8 DCT-II basis matrix.
fn dct8_basis() -> [[f64; 8]; 8] {
    let mut basis = [[0.0f64; 8]; 8];
    for (u, row) in basis.iter_mut().enumerate() {
        let alpha = if u == 0 {
            (1.0f64 / 8.0).sqrt()
        } else {
            (2.0f64 / 8.0).sqrt()
        };
        for (x, value) in row.iter_mut().enumerate() {
            *value = alpha * ((2.0 * x as f64 + 1.0) * u as f64 * PI / 16.0).cos();
        }
    }
    basis
}

/// Mean ratio of high-frequency border coefficients to interior AC
/// coefficients over all full 8x8 DCT blocks. A high ratio flags the
/// periodic up-sampling grid artifacts typical of generative upscaling.
///
/// Border means the outermost coefficient row and column (u == 7 or
/// v == 7); interior is every other coefficient except DC.
pub fn block_artifact_ratio(gray: &Array2<f32>) -> f64 {
    let (h, w) = gray.dim();
    let (blocks_y, blocks_x) = (h / 8, w / 8);
    if blocks_y == 0 || blocks_x == 0 {
        return 0.0;
    }

    let basis = dct8_basis();
    let mut ratio_sum = 0.0f64;

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            // coeff = C * block * C^T
            let mut tmp = [[0.0f64; 8]; 8];
            for u in 0..8 {
                for x in 0..8 {
                    let mut acc = 0.0;
                    for k in 0..8 {
                        acc += basis[u][k] * gray[[by * 8 + k, bx * 8 + x]] as f64;
                    }
                    tmp[u][x] = acc;
                }
            }

            let mut border_sum = 0.0f64;
            let mut interior_sum = 0.0f64;
            for u in 0..8 {
                for v in 0..8 {
                    let mut coeff = 0.0;
                    for k in 0..8 {
                        coeff += tmp[u][k] * basis[v][k];
                    }
                    if u == 7 || v == 7 {
                        border_sum += coeff.abs();
                    } else if u != 0 || v != 0 {
                        interior_sum += coeff.abs();
                    }
                }
            }

            let border_mean = border_sum / 15.0;
            let interior_mean = interior_sum / 48.0;
            ratio_sum += border_mean / (interior_mean + 1e-10);
        }
    }

    ratio_sum / (blocks_y * blocks_x) as f64
}

/// Shannon entropy (nats) of the 36-bin gradient orientation histogram.
/// Lower entropy means orientation clustering, a synthetic look.
pub fn gradient_orientation_entropy(gray: &Array2<f32>) -> f64 {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let (gx, gy) = sobel(gray);
    let mut histogram = [0u64; 36];
    let mut total = 0u64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let (dx, dy) = (gx[[y, x]], gy[[y, x]]);
            if (dx * dx + dy * dy).sqrt() <= ORIENTATION_MIN_MAGNITUDE {
                continue;
            }
            let theta = (dy as f64).atan2(dx as f64);
            let bin = (((theta + PI) / (2.0 * PI)) * 36.0) as usize;
            histogram[bin.min(35)] += 1;
            total += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }

    let mut entropy = 0.0f64;
    for &count in &histogram {
        if count > 0 {
            let p = count as f64 / total as f64;
            entropy -= p * p.ln();
        }
    }
    entropy
}

/// Spatial non-uniformity of sharpness: std-dev of the per-patch Laplacian
/// variance across 16x16 tiles.
pub fn local_texture_entropy(gray: &Array2<f32>) -> f64 {
    let (h, w) = gray.dim();
    let (patches_y, patches_x) = (h / TEXTURE_PATCH, w / TEXTURE_PATCH);
    if patches_y * patches_x < 2 {
        return 0.0;
    }

    let mut values = Vec::with_capacity(patches_y * patches_x);
    for py in 0..patches_y {
        for px in 0..patches_x {
            let patch = gray.slice(s![
                py * TEXTURE_PATCH..(py + 1) * TEXTURE_PATCH,
                px * TEXTURE_PATCH..(px + 1) * TEXTURE_PATCH
            ]);
            values.push(laplacian_variance(patch));
        }
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    variance.sqrt()
}

/// High-pass residual of one color channel (channel minus 3x3 box blur),
/// interior pixels only.
fn channel_residual(rgb: &Array3<f32>, channel: usize) -> Vec<f64> {
    let (h, w, _) = rgb.dim();
    let mut residual = Vec::with_capacity((h - 2) * (w - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut sum = 0.0f32;
            for dy in 0..3 {
                for dx in 0..3 {
                    sum += rgb[[y + dy - 1, x + dx - 1, channel]];
                }
            }
            residual.push((rgb[[y, x, channel]] - sum / 9.0) as f64);
        }
    }
    residual
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a) * (x - mean_a);
        var_b += (y - mean_b) * (y - mean_b);
    }

    // Flat residuals carry no noise to correlate; treat as fully
    // correlated so the signal stays sensor-neutral.
    if var_a < 1e-12 || var_b < 1e-12 {
        return 1.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// 1 - |mean pairwise correlation| of the per-channel high-pass residuals.
/// Real sensors produce correlated noise across channels; independent
/// channel noise is atypical and pushes this signal up.
pub fn color_noise_correlation(rgb: &Array3<f32>) -> f64 {
    let (h, w, _) = rgb.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let r = channel_residual(rgb, 0);
    let g = channel_residual(rgb, 1);
    let b = channel_residual(rgb, 2);

    let mean_corr = (pearson(&r, &g) + pearson(&r, &b) + pearson(&g, &b)) / 3.0;
    1.0 - mean_corr.abs()
}

/// Mean HSV saturation of the color frame, 0-1.
pub fn saturation(rgb: &Array3<f32>) -> f64 {
    let (h, w, _) = rgb.dim();
    if h == 0 || w == 0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            let r = rgb[[y, x, 0]];
            let g = rgb[[y, x, 1]];
            let b = rgb[[y, x, 2]];
            let cmax = r.max(g).max(b);
            let cmin = r.min(g).min(b);
            if cmax > 0.0 {
                sum += ((cmax - cmin) / cmax) as f64;
            }
        }
    }
    sum / (h * w) as f64
}
