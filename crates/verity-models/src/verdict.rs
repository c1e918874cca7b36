//! Verdict labels and the certification action mapping.

use serde::{Deserialize, Serialize};

/// Discrete verdict derived from the authenticity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Authenticity at or above the real threshold.
    Real,
    /// Between the undetermined and real thresholds.
    Undetermined,
    /// Below the undetermined threshold.
    Ai,
}

impl Verdict {
    /// Get string representation of the verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "REAL",
            Verdict::Undetermined => "UNDETERMINED",
            Verdict::Ai => "AI",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action the certification pipeline takes for a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertAction {
    /// Stamp and store the video as certified.
    Certify,
    /// Hold the video for manual review.
    Review,
    /// Reject the video.
    Reject,
}

impl CertAction {
    /// Get string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            CertAction::Certify => "certify",
            CertAction::Review => "review",
            CertAction::Reject => "reject",
        }
    }
}

impl std::fmt::Display for CertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict-to-action mapping consumed by the certification boundary.
///
/// This is configuration data, not logic; deployments can remap it (for
/// example routing AI verdicts to review instead of rejection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMap {
    /// Action for REAL verdicts.
    pub real: CertAction,
    /// Action for UNDETERMINED verdicts.
    pub undetermined: CertAction,
    /// Action for AI verdicts.
    pub ai: CertAction,
}

impl Default for ActionMap {
    fn default() -> Self {
        Self {
            real: CertAction::Certify,
            undetermined: CertAction::Review,
            ai: CertAction::Reject,
        }
    }
}

impl ActionMap {
    /// Look up the action for a verdict.
    pub fn action_for(&self, verdict: Verdict) -> CertAction {
        match verdict {
            Verdict::Real => self.real,
            Verdict::Undetermined => self.undetermined,
            Verdict::Ai => self.ai,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_serializes_screaming() {
        assert_eq!(serde_json::to_string(&Verdict::Ai).unwrap(), "\"AI\"");
        assert_eq!(serde_json::to_string(&Verdict::Real).unwrap(), "\"REAL\"");
    }

    #[test]
    fn test_default_mapping() {
        let map = ActionMap::default();
        assert_eq!(map.action_for(Verdict::Real), CertAction::Certify);
        assert_eq!(map.action_for(Verdict::Undetermined), CertAction::Review);
        assert_eq!(map.action_for(Verdict::Ai), CertAction::Reject);
    }

    #[test]
    fn test_remapped_actions() {
        let json = r#"{"real":"certify","undetermined":"review","ai":"review"}"#;
        let map: ActionMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.action_for(Verdict::Ai), CertAction::Review);
    }
}
