//! Hosted vision-model HTTP client.
//!
//! Sends a bounded set of JPEG-encoded still frames to a chat-completions
//! endpoint and parses the reply into an [`EngineScore`]. As a secondary
//! engine it never fails the pipeline: every error path maps to an
//! unavailable score, which the combiner excludes.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use verity_models::{EngineScore, ScoreEngine, StillFrame};

use crate::error::{VisionError, VisionResult};
use crate::types::{
    parse_verdict, ChatMessage, ChatRequest, ChatResponse, ContentPart, ImageUrl, VisionVerdict,
    DETECTION_PROMPT,
};

/// Name the vision engine reports in scores and diagnostics.
pub const VISION_ENGINE: &str = "vision";

/// Configuration for the vision client.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// API key. Empty means the engine is not configured.
    pub api_key: String,
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Max retries for retryable failures.
    pub max_retries: u32,
    /// Frames sent per clip.
    pub max_frames: usize,
    /// JPEG quality for frame encoding, cost control.
    pub jpeg_quality: u8,
    /// Frames larger than this on either side are downscaled.
    pub max_dimension: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            max_frames: 8,
            jpeg_quality: 70,
            max_dimension: 512,
        }
    }
}

impl VisionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            endpoint: std::env::var("VERITY_VISION_ENDPOINT").unwrap_or(defaults.endpoint),
            model: std::env::var("VERITY_VISION_MODEL").unwrap_or(defaults.model),
            timeout: Duration::from_secs(
                std::env::var("VERITY_VISION_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("VERITY_VISION_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            max_frames: defaults.max_frames,
            jpeg_quality: defaults.jpeg_quality,
            max_dimension: defaults.max_dimension,
        }
    }

    /// True when an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Client for the hosted vision model.
pub struct VisionClient {
    http: Client,
    config: VisionConfig,
}

impl VisionClient {
    /// Create a new vision client.
    pub fn new(config: VisionConfig) -> VisionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VisionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Self::new(VisionConfig::from_env())
    }

    /// Encode a still frame as a base64 JPEG data URL, downscaling to the
    /// configured max dimension first.
    fn encode_frame(&self, frame: &StillFrame) -> VisionResult<String> {
        let img = RgbImage::from_raw(frame.width, frame.height, frame.rgb.clone())
            .ok_or_else(|| VisionError::Encoding("frame buffer size mismatch".to_string()))?;

        let longest = frame.width.max(frame.height);
        let img = if longest > self.config.max_dimension {
            let scale = self.config.max_dimension as f64 / longest as f64;
            let w = ((frame.width as f64 * scale) as u32).max(1);
            let h = ((frame.height as f64 * scale) as u32).max(1);
            image::imageops::resize(&img, w, h, FilterType::Triangle)
        } else {
            img
        };

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut Cursor::new(&mut jpeg), self.config.jpeg_quality)
            .encode_image(&img)
            .map_err(|e| VisionError::Encoding(e.to_string()))?;

        Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg)))
    }

    fn build_request(&self, data_urls: Vec<String>) -> ChatRequest {
        let mut content = vec![ContentPart::Text {
            text: DETECTION_PROMPT.to_string(),
        }];
        for url in data_urls {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url,
                    detail: "high",
                },
            });
        }

        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens: 300,
            // Low temperature for consistent scoring.
            temperature: 0.1,
        }
    }

    /// Analyze the given frames and return the parsed verdict.
    pub async fn analyze(&self, frames: &[StillFrame]) -> VisionResult<VisionVerdict> {
        if !self.config.is_configured() {
            return Err(VisionError::NotConfigured(
                "OPENAI_API_KEY not set".to_string(),
            ));
        }
        if frames.is_empty() {
            return Err(VisionError::NoFrames);
        }

        let data_urls: Vec<String> = frames
            .iter()
            .take(self.config.max_frames)
            .map(|f| self.encode_frame(f))
            .collect::<VisionResult<_>>()?;

        debug!(
            frames = data_urls.len(),
            model = %self.config.model,
            "sending frames for vision analysis"
        );

        let request = self.build_request(data_urls);
        let raw_text = self
            .with_retry(|| async { self.send(&request).await })
            .await?;

        let verdict = parse_verdict(&raw_text)?;
        info!(
            ai_probability = verdict.ai_probability,
            flags = verdict.flags.len(),
            "vision verdict parsed"
        );
        Ok(verdict)
    }

    async fn send(&self, request: &ChatRequest) -> VisionResult<String> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(VisionError::Network)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(VisionError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::RequestFailed(format!(
                "vision API returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| VisionError::InvalidResponse("no choices in reply".to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> VisionResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = VisionResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "vision request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| VisionError::RequestFailed("unknown error".to_string())))
    }
}

#[async_trait]
impl ScoreEngine for VisionClient {
    fn name(&self) -> &'static str {
        VISION_ENGINE
    }

    async fn score(&self, frames: &[StillFrame]) -> EngineScore {
        match self.analyze(frames).await {
            Ok(verdict) => EngineScore::scored(
                VISION_ENGINE,
                verdict.ai_probability,
                verdict.reasoning,
            )
            .with_flags(verdict.flags),
            Err(e) => {
                warn!(reason = %e, "vision engine unavailable");
                EngineScore::unavailable(VISION_ENGINE, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: String) -> VisionConfig {
        VisionConfig {
            api_key: "test-key".to_string(),
            endpoint,
            max_retries: 0,
            ..Default::default()
        }
    }

    fn gray_still() -> StillFrame {
        StillFrame {
            width: 64,
            height: 64,
            rgb: vec![128; 64 * 64 * 3],
        }
    }

    fn reply(content: &str) -> serde_json::Value {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[test]
    fn test_config_defaults() {
        let config = VisionConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_frames, 8);
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.max_dimension, 512);
        assert!(!config.is_configured());
    }

    #[tokio::test]
    async fn test_successful_analysis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                r#"{"ai_probability": 88, "reasoning": "impossible physics", "flags": ["floating water"]}"#,
            )))
            .mount(&server)
            .await;

        let client = VisionClient::new(test_config(format!(
            "{}/v1/chat/completions",
            server.uri()
        )))
        .unwrap();

        let score = client.score(&[gray_still()]).await;
        assert!(score.available);
        assert_eq!(score.value, 88);
        assert_eq!(score.diagnostic, "impossible physics");
        assert_eq!(score.flags, vec!["floating water".to_string()]);
    }

    #[tokio::test]
    async fn test_code_fenced_reply_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                "```json\n{\"ai_probability\": 25, \"reasoning\": \"ordinary\", \"flags\": []}\n```",
            )))
            .mount(&server)
            .await;

        let client = VisionClient::new(test_config(server.uri())).unwrap();
        let score = client.score(&[gray_still()]).await;
        assert!(score.available);
        assert_eq!(score.value, 25);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let client = VisionClient::new(test_config(server.uri())).unwrap();
        let score = client.score(&[gray_still()]).await;
        assert!(!score.available);
        assert_eq!(score.value, 50);
    }

    #[tokio::test]
    async fn test_garbage_reply_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(reply("this clip is probably AI")),
            )
            .mount(&server)
            .await;

        let client = VisionClient::new(test_config(server.uri())).unwrap();
        let score = client.score(&[gray_still()]).await;
        assert!(!score.available);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let client = VisionClient::new(VisionConfig::default()).unwrap();
        let score = client.score(&[gray_still()]).await;
        assert!(!score.available);
        assert!(score.diagnostic.contains("not configured"));
    }

    #[tokio::test]
    async fn test_empty_frames_is_unavailable() {
        let client = VisionClient::new(test_config("http://localhost:1".to_string())).unwrap();
        let score = client.score(&[]).await;
        assert!(!score.available);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                r#"{"ai_probability": 40, "reasoning": "ok", "flags": []}"#,
            )))
            .mount(&server)
            .await;

        let mut config = test_config(server.uri());
        config.max_retries = 2;
        let client = VisionClient::new(config).unwrap();
        let score = client.score(&[gray_still()]).await;
        assert!(score.available);
        assert_eq!(score.value, 40);
    }

    #[test]
    fn test_encode_frame_downscales() {
        let mut config = test_config("http://localhost:1".to_string());
        config.max_dimension = 16;
        let client = VisionClient::new(config).unwrap();

        let url = client.encode_frame(&gray_still()).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let jpeg = BASE64
            .decode(url.trim_start_matches("data:image/jpeg;base64,"))
            .unwrap();
        let img = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(img.width().max(img.height()), 16);
    }
}
