//! Multi-engine score combination.
//!
//! Unavailable engines are excluded outright. Their weight is dropped and
//! the remaining weights are renormalized; a failed engine's placeholder
//! value is never blended in as if it were a measurement. With every
//! secondary engine unavailable, the combined score equals the primary
//! score exactly.

use tracing::warn;
use verity_models::EngineScore;

/// Name the combiner reports on its output score.
pub const COMBINED_ENGINE: &str = "combined";

/// Combine the primary score with zero or more secondary scores.
///
/// `weights[0]` applies to the primary engine, `weights[1..]` to the
/// secondaries in order. Missing weights default to 1.0. The result is the
/// weighted mean over the available engines, rounded to the nearest integer
/// and clamped to [0,100]; its flags are the union of contributing flags.
pub fn combine(primary: &EngineScore, others: &[EngineScore], weights: &[f64]) -> EngineScore {
    let weight_for = |index: usize| weights.get(index).copied().unwrap_or(1.0);

    let mut contributions: Vec<(&EngineScore, f64)> = vec![(primary, weight_for(0))];
    for (i, other) in others.iter().enumerate() {
        if other.available {
            contributions.push((other, weight_for(i + 1)));
        } else {
            warn!(
                engine = %other.engine,
                reason = %other.diagnostic,
                "engine unavailable, excluded from combination"
            );
        }
    }

    if contributions.len() == 1 {
        // Only the primary engine contributed; pass its score through.
        let mut score = primary.clone();
        score.engine = COMBINED_ENGINE.to_string();
        score.diagnostic = format!("{} only: {}", primary.engine, primary.value);
        return score;
    }

    let total_weight: f64 = contributions.iter().map(|(_, w)| w).sum();
    let value = if total_weight > 0.0 {
        let weighted: f64 = contributions
            .iter()
            .map(|(score, w)| score.value as f64 * w)
            .sum();
        (weighted / total_weight).round().clamp(0.0, 100.0) as u8
    } else {
        primary.value
    };

    let diagnostic = contributions
        .iter()
        .map(|(score, w)| format!("{}={} (w {:.2})", score.engine, score.value, w / total_weight.max(1e-10)))
        .collect::<Vec<_>>()
        .join(", ");

    let flags = contributions
        .iter()
        .flat_map(|(score, _)| score.flags.iter().cloned())
        .collect();

    EngineScore::scored(COMBINED_ENGINE, value, diagnostic).with_flags(flags)
}
