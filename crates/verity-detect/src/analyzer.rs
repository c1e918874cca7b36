//! The single call surface of the pipeline.
//!
//! `Analyzer::analyze` runs the whole chain for one clip: sample frames,
//! extract and aggregate signals, score with the primary engine, consult
//! secondary engines on exported stills, combine, and label. Data flows
//! strictly left to right; nothing is retained between calls, so analyzers
//! can be shared across tasks and clips analyze concurrently.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use verity_models::{CertAction, CombinedResult, EngineScore, ScoreEngine};

use crate::aggregate::aggregate;
use crate::combine::combine;
use crate::config::DetectionConfig;
use crate::decision::certification_action;
use crate::error::DetectResult;
use crate::labeler::Labeler;
use crate::sampler::sample_frames;
use crate::scoring::ScoringEngine;

/// Number of still frames exported to secondary engines.
const STILLS_PER_CLIP: usize = 8;

/// Configured analysis pipeline for one calibration.
pub struct Analyzer {
    config: DetectionConfig,
    scorer: ScoringEngine,
    labeler: Labeler,
    secondaries: Vec<Arc<dyn ScoreEngine>>,
}

impl Analyzer {
    /// Create an analyzer. Configuration problems surface here, once, not
    /// per call.
    pub fn new(config: DetectionConfig) -> DetectResult<Self> {
        config.validate()?;
        let scorer = ScoringEngine::new(config.table.clone())?;
        let labeler = Labeler::new(config.thresholds)?;
        Ok(Self {
            config,
            scorer,
            labeler,
            secondaries: Vec::new(),
        })
    }

    /// Register a secondary engine. Weights come from
    /// `config.weights[1..]` in registration order.
    pub fn with_engine(mut self, engine: Arc<dyn ScoreEngine>) -> Self {
        self.secondaries.push(engine);
        self
    }

    /// Analyze a local video file.
    ///
    /// Returns [`crate::error::DetectError::CannotDecode`] when the file
    /// cannot be opened as a video or yields no frames; a clip that cannot
    /// be analyzed never receives a numeric score.
    pub async fn analyze(&self, path: impl AsRef<Path>) -> DetectResult<CombinedResult> {
        let path = path.as_ref();

        let buffer = sample_frames(path, &self.config.sampling).await?;
        info!(
            video = %path.display(),
            frames = buffer.len(),
            fps = buffer.source_fps,
            "sampled frames for analysis"
        );

        let signals = aggregate(&buffer);
        let primary = self.scorer.score(&signals)?;
        info!(engine = %primary.engine, score = primary.value, "primary engine scored clip");

        let stills = buffer.stills(STILLS_PER_CLIP);
        drop(buffer);

        let mut engine_scores: Vec<EngineScore> = vec![primary.clone()];
        for engine in &self.secondaries {
            let score = engine.score(&stills).await;
            if score.available {
                info!(engine = %score.engine, score = score.value, "secondary engine scored clip");
            } else {
                warn!(engine = %score.engine, reason = %score.diagnostic, "secondary engine unavailable");
            }
            engine_scores.push(score);
        }

        let combined = combine(&primary, &engine_scores[1..], &self.config.weights);
        let ai_score = combined.value;
        let authenticity = 100 - ai_score;
        let label = self.labeler.label(authenticity);

        info!(
            video = %path.display(),
            ai_score = ai_score,
            authenticity = authenticity,
            label = %label,
            "analysis complete"
        );

        engine_scores.push(combined);

        Ok(CombinedResult {
            ai_score,
            authenticity,
            label,
            signals,
            engine_scores,
            thresholds: self.labeler.thresholds(),
        })
    }

    /// Map an analysis result to the certification action configured for
    /// its verdict.
    pub fn action_for(&self, result: &CombinedResult) -> CertAction {
        certification_action(result.label, &self.config.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use verity_models::{StillFrame, Verdict};

    struct FixedEngine(EngineScore);

    #[async_trait]
    impl ScoreEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }
        async fn score(&self, _frames: &[StillFrame]) -> EngineScore {
            self.0.clone()
        }
    }

    #[test]
    fn test_invalid_config_fails_at_construction() {
        let config = DetectionConfig {
            weights: vec![-1.0],
            ..Default::default()
        };
        assert!(Analyzer::new(config).is_err());
    }

    #[tokio::test]
    async fn test_analyze_missing_file_is_cannot_decode() {
        let analyzer = Analyzer::new(DetectionConfig::default()).unwrap();
        let err = analyzer.analyze("/nonexistent/clip.mp4").await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::DetectError::CannotDecode { .. }
        ));
    }

    #[test]
    fn test_action_follows_label() {
        let analyzer = Analyzer::new(DetectionConfig::default()).unwrap();
        let result = CombinedResult {
            ai_score: 80,
            authenticity: 20,
            label: Verdict::Ai,
            signals: verity_models::SignalVector::new(),
            engine_scores: Vec::new(),
            thresholds: Default::default(),
        };
        assert_eq!(analyzer.action_for(&result), CertAction::Reject);
    }

    #[tokio::test]
    async fn test_registered_engine_is_consulted() {
        // Exercised end-to-end in tests/pipeline.rs with real frames; here
        // just make sure registration compiles with a trait object.
        let analyzer = Analyzer::new(DetectionConfig::default())
            .unwrap()
            .with_engine(Arc::new(FixedEngine(EngineScore::scored("fixed", 90, "x"))));
        assert_eq!(analyzer.secondaries.len(), 1);
    }
}
