//! Certification boundary: verdict to pipeline action.
//!
//! The mapping itself is configuration ([`ActionMap`]); stamping, storage,
//! and notification are external collaborators that consume the action.

use verity_models::{ActionMap, CertAction, Verdict};

/// Resolve the certification action for a verdict under the given mapping.
pub fn certification_action(verdict: Verdict, actions: &ActionMap) -> CertAction {
    actions.action_for(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routing() {
        let actions = ActionMap::default();
        assert_eq!(
            certification_action(Verdict::Real, &actions),
            CertAction::Certify
        );
        assert_eq!(
            certification_action(Verdict::Undetermined, &actions),
            CertAction::Review
        );
        assert_eq!(
            certification_action(Verdict::Ai, &actions),
            CertAction::Reject
        );
    }
}
