//! Wire types for the hosted chat-completions API and verdict parsing.

use serde::{Deserialize, Serialize};

use crate::error::{VisionError, VisionResult};

/// Caps applied to parsed model output so a misbehaving model cannot
/// inflate the result payload.
const MAX_REASONING_CHARS: usize = 500;
const MAX_FLAGS: usize = 10;
const MAX_FLAG_CHARS: usize = 100;

/// Instruction text sent ahead of the frames.
///
/// The model is asked for semantic anomalies signal analysis cannot see:
/// explicit AI labels in overlays, impossible physics, compositing, and
/// rendered-looking content. It is explicitly told not to penalize
/// compression artifacts or caption overlays, which are common in real
/// phone footage.
pub const DETECTION_PROMPT: &str = "\
You are an expert AI-generated and VFX video detector. Analyze these video frames \
and determine if this video was generated or enhanced by AI or VFX.\n\n\
CRITICAL: Check for ANY text in the frames that says 'AI-generated', \
'AI enhanced', 'AI created', 'made with AI', or similar labels. \
If you see such text, score ai_probability at 95+.\n\n\
Look for these STRONG AI/VFX indicators:\n\
- Text overlay stating 'AI-generated', 'AI-enhanced', or similar\n\
- Impossible or physically impossible scenes (ocean waves indoors, \
wave pools on ship decks, impossible weather, supernatural events)\n\
- VFX compositing: elements that look digitally added to real footage\n\
- Water, fire, or weather that looks CGI or unnaturally perfect\n\
- Obvious AI art style (plastic skin, unnaturally perfect faces, dreamlike quality)\n\
- Objects morphing or changing shape between frames\n\
- Distorted or nonsensical text and signs\n\
- Background that looks painted or rendered, not photographed\n\
- Creatures or beings that cannot exist in reality\n\
- Movie set with blue/green screen visible in background\n\
- Viral 'unexplained phenomena' style content with impossible subjects\n\n\
These are NOT reliable AI indicators, do NOT penalize for:\n\
- Low resolution or compression artifacts (common in phone videos)\n\
- Slight blur or noise (normal for real cameras)\n\
- Text overlays or captions (these are edits, not AI generation)\n\n\
Real video indicators:\n\
- Natural camera motion and shake with no impossible elements\n\
- Consistent lighting and physics throughout\n\
- Ordinary everyday scenes that obey physics\n\n\
Respond ONLY with a JSON object in this exact format:\n\
{\n\
  \"ai_probability\": <integer 0-100>,\n\
  \"reasoning\": \"<one sentence summary>\",\n\
  \"flags\": [\"<specific anomaly 1>\", \"<specific anomaly 2>\"]\n\
}\n\
Where ai_probability=100 means definitely AI/VFX, 0 means definitely real.\n\
For ordinary phone videos with no AI artifacts, score 15-30.\n\
For videos with impossible composited elements or impossible physics, score 75-95.\n\
For videos explicitly labeled AI-generated, score 95+.\n\
flags should list specific anomalies detected (empty array if none).";

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
    /// "high" so the model can read text overlays.
    pub detail: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
}

/// Parsed and sanitized model verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionVerdict {
    /// AI likelihood 0-100, clamped.
    pub ai_probability: u8,
    /// One-sentence summary, truncated.
    pub reasoning: String,
    /// Specific anomalies, bounded in count and length.
    pub flags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default = "default_probability")]
    ai_probability: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    flags: Vec<String>,
}

fn default_probability() -> f64 {
    50.0
}

/// Strip a markdown code fence wrapper if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.contains("```") {
        return trimmed;
    }
    let mut parts = trimmed.split("```");
    parts.next();
    let inner = parts.next().unwrap_or(trimmed);
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Parse the model's reply into a bounded verdict.
///
/// Tolerates a code-fenced reply and missing fields; rejects replies that
/// are not JSON at all.
pub fn parse_verdict(raw_text: &str) -> VisionResult<VisionVerdict> {
    let body = strip_code_fence(raw_text);
    let raw: RawVerdict = serde_json::from_str(body)
        .map_err(|e| VisionError::InvalidResponse(format!("not a verdict object: {e}")))?;

    let ai_probability = raw.ai_probability.clamp(0.0, 100.0).round() as u8;
    let reasoning = truncate_chars(&raw.reasoning, MAX_REASONING_CHARS);
    let flags = raw
        .flags
        .iter()
        .take(MAX_FLAGS)
        .map(|f| truncate_chars(f, MAX_FLAG_CHARS))
        .collect();

    Ok(VisionVerdict {
        ai_probability,
        reasoning,
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let verdict = parse_verdict(
            r#"{"ai_probability": 85, "reasoning": "melting text on signs", "flags": ["melting text"]}"#,
        )
        .unwrap();
        assert_eq!(verdict.ai_probability, 85);
        assert_eq!(verdict.reasoning, "melting text on signs");
        assert_eq!(verdict.flags, vec!["melting text".to_string()]);
    }

    #[test]
    fn test_parse_code_fenced_json() {
        let raw = "```json\n{\"ai_probability\": 20, \"reasoning\": \"ordinary footage\", \"flags\": []}\n```";
        let verdict = parse_verdict(raw).unwrap();
        assert_eq!(verdict.ai_probability, 20);
        assert!(verdict.flags.is_empty());
    }

    #[test]
    fn test_parse_clamps_probability() {
        let verdict = parse_verdict(r#"{"ai_probability": 250, "reasoning": "", "flags": []}"#).unwrap();
        assert_eq!(verdict.ai_probability, 100);

        let verdict = parse_verdict(r#"{"ai_probability": -7, "reasoning": "", "flags": []}"#).unwrap();
        assert_eq!(verdict.ai_probability, 0);
    }

    #[test]
    fn test_parse_missing_fields_default() {
        let verdict = parse_verdict("{}").unwrap();
        assert_eq!(verdict.ai_probability, 50);
        assert!(verdict.reasoning.is_empty());
        assert!(verdict.flags.is_empty());
    }

    #[test]
    fn test_parse_bounds_reasoning_and_flags() {
        let long = "x".repeat(2000);
        let raw = format!(
            r#"{{"ai_probability": 60, "reasoning": "{long}", "flags": [{}]}}"#,
            (0..20)
                .map(|_| format!("\"{long}\""))
                .collect::<Vec<_>>()
                .join(",")
        );
        let verdict = parse_verdict(&raw).unwrap();
        assert_eq!(verdict.reasoning.chars().count(), 500);
        assert_eq!(verdict.flags.len(), 10);
        assert!(verdict.flags.iter().all(|f| f.chars().count() == 100));
    }

    #[test]
    fn test_parse_non_json_is_error() {
        assert!(parse_verdict("I think it is probably AI.").is_err());
    }

    #[test]
    fn test_request_serializes_tagged_content() {
        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: "hello".to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/jpeg;base64,abcd".to_string(),
                            detail: "high",
                        },
                    },
                ],
            }],
            max_tokens: 300,
            temperature: 0.1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["detail"],
            "high"
        );
    }
}
