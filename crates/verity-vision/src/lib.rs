//! Hosted vision-model scoring engine.
//!
//! Sends key still frames to a multimodal chat-completions API and parses
//! its semantic verdict (impossible physics, AI art style, explicit
//! AI-generated labels) into an engine score. Implements the
//! [`verity_models::ScoreEngine`] contract: any failure, missing API key
//! included, reports as unavailable rather than erroring the pipeline.

pub mod client;
pub mod error;
pub mod types;

pub use client::{VisionClient, VisionConfig, VISION_ENGINE};
pub use error::{VisionError, VisionResult};
pub use types::{parse_verdict, VisionVerdict};
