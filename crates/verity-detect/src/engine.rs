//! Quick secondary heuristic engine.
//!
//! A cheaper engine over the same still frames handed to external engines:
//! noise, edge density, and motion only. Useful as a sanity cross-check on
//! the primary engine and as a fallback contributor when the vision engine
//! is unavailable.

use async_trait::async_trait;
use ndarray::Array2;
use tracing::debug;
use verity_models::{EngineScore, ScoreEngine, StillFrame};

use crate::spatial;
use crate::temporal;

/// Name the quick engine reports in scores and diagnostics.
pub const QUICK_ENGINE: &str = "quick";

/// Reduced-signal heuristic engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickEngine;

impl QuickEngine {
    /// Create a quick engine.
    pub fn new() -> Self {
        Self
    }
}

fn still_to_gray(still: &StillFrame) -> Array2<f32> {
    let (w, h) = (still.width as usize, still.height as usize);
    Array2::from_shape_fn((h, w), |(y, x)| {
        let base = (y * w + x) * 3;
        0.299 * still.rgb[base] as f32
            + 0.587 * still.rgb[base + 1] as f32
            + 0.114 * still.rgb[base + 2] as f32
    })
}

#[async_trait]
impl ScoreEngine for QuickEngine {
    fn name(&self) -> &'static str {
        QUICK_ENGINE
    }

    async fn score(&self, frames: &[StillFrame]) -> EngineScore {
        if frames.is_empty() {
            return EngineScore::unavailable(QUICK_ENGINE, "no frames to score");
        }

        let grays: Vec<Array2<f32>> = frames.iter().map(still_to_gray).collect();

        let noise =
            grays.iter().map(|g| spatial::noise(g)).sum::<f64>() / grays.len() as f64;
        let edges =
            grays.iter().map(|g| spatial::edge_density(g)).sum::<f64>() / grays.len() as f64;
        let motion = if grays.len() >= 2 {
            grays
                .windows(2)
                .map(|pair| temporal::mean_abs_diff(&pair[0], &pair[1]))
                .sum::<f64>()
                / (grays.len() - 1) as f64
        } else {
            0.0
        };

        let mut value: i32 = 50;
        if noise < 45.0 {
            value += 15;
        } else if noise >= 500.0 {
            value -= 15;
        }
        if edges < 10.0 {
            value += 10;
        } else if edges >= 30.0 {
            value -= 10;
        }
        if grays.len() >= 2 && motion < 2.0 {
            value += 10;
        }

        let clamped = value.clamp(0, 100) as u8;
        debug!(
            noise = noise,
            edges = edges,
            motion = motion,
            score = clamped,
            "quick engine scored clip"
        );

        EngineScore::scored(
            QUICK_ENGINE,
            clamped,
            format!("noise={noise:.1} edges={edges:.1} motion={motion:.1}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_still(width: u32, height: u32, value: u8) -> StillFrame {
        StillFrame {
            width,
            height,
            rgb: vec![value; (width * height * 3) as usize],
        }
    }

    #[tokio::test]
    async fn test_empty_frames_are_unavailable() {
        let score = QuickEngine::new().score(&[]).await;
        assert!(!score.available);
    }

    #[tokio::test]
    async fn test_flat_static_frames_score_ai_leaning() {
        let frames: Vec<StillFrame> = (0..4).map(|_| solid_still(64, 64, 128)).collect();
        let score = QuickEngine::new().score(&frames).await;
        assert!(score.available);
        // Zero noise, zero edges, zero motion: all three buckets apply.
        assert_eq!(score.value, 85);
    }

    #[tokio::test]
    async fn test_single_frame_skips_motion() {
        let score = QuickEngine::new().score(&[solid_still(64, 64, 0)]).await;
        assert_eq!(score.value, 75);
    }
}
