//! Multi-signal AI-generation likelihood scoring for video clips.
//!
//! This crate provides:
//! - Bounded, strided frame sampling over an FFmpeg rawvideo pipe
//! - Spatial and temporal signal extraction; signals a clip is too short
//!   to measure are omitted rather than scored
//! - A data-driven bucket scoring table (calibration without code changes)
//! - Multi-engine combination with exclusion of unavailable engines
//! - Verdict labeling and the certification action boundary
//!
//! The pipeline is deterministic and stateless per clip: [`Analyzer`] holds
//! only immutable configuration, so analysis calls for different clips run
//! concurrently without synchronization.

pub mod aggregate;
pub mod analyzer;
pub mod combine;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod labeler;
pub mod probe;
pub mod sampler;
pub mod scoring;
pub mod spatial;
pub mod temporal;

// Re-export common types
pub use aggregate::aggregate;
pub use analyzer::Analyzer;
pub use combine::combine;
pub use config::{DetectionConfig, SamplingConfig};
pub use decision::certification_action;
pub use engine::QuickEngine;
pub use error::{DetectError, DetectResult};
pub use labeler::Labeler;
pub use probe::{probe_video, VideoInfo};
pub use sampler::{sample_frames, Frame, FrameBuffer};
pub use scoring::{default_table, Bucket, Predicate, ScoringEngine, ScoringTable, SignalRule};
