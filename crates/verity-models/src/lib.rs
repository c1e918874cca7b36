//! Shared data models for the Verity detection pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Extracted signals and the aggregated signal vector
//! - The uniform engine score contract (primary, quick, vision)
//! - Verdicts, certification actions, and label thresholds
//! - The combined analysis result returned to callers

pub mod engine;
pub mod frame;
pub mod result;
pub mod signal;
pub mod verdict;

// Re-export common types
pub use engine::{EngineScore, ScoreEngine};
pub use frame::StillFrame;
pub use result::{CombinedResult, Thresholds};
pub use signal::{Signal, SignalVector};
pub use verdict::{ActionMap, CertAction, Verdict};
