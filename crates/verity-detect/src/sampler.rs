//! Frame sampling via an FFmpeg rawvideo pipe.
//!
//! Decodes a bounded, evenly-strided sequence of frames from a local video
//! file. One FFmpeg invocation streams RGB24 frames at analysis resolution;
//! the select filter applies the stride and `-frames:v` / `-t` enforce the
//! sample and duration caps, so order is preserved and no frame is ever
//! re-read.

use std::path::Path;
use std::process::Stdio;

use ndarray::{Array2, Array3};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};
use verity_models::StillFrame;

use crate::config::SamplingConfig;
use crate::error::{DetectError, DetectResult};
use crate::probe::probe_video;

/// One decoded sample frame: grayscale plane plus the original color planes.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Rec.601 luma, values 0-255.
    pub gray: Array2<f32>,
    /// Color planes indexed `[y, x, channel]`, values 0-255.
    pub rgb: Array3<f32>,
}

impl Frame {
    /// Build a frame from packed RGB24 bytes.
    pub fn from_rgb24(data: &[u8], width: usize, height: usize) -> Self {
        let mut rgb = Array3::<f32>::zeros((height, width, 3));
        let mut gray = Array2::<f32>::zeros((height, width));

        for y in 0..height {
            for x in 0..width {
                let base = (y * width + x) * 3;
                let r = data[base] as f32;
                let g = data[base + 1] as f32;
                let b = data[base + 2] as f32;
                rgb[[y, x, 0]] = r;
                rgb[[y, x, 1]] = g;
                rgb[[y, x, 2]] = b;
                gray[[y, x]] = 0.299 * r + 0.587 * g + 0.114 * b;
            }
        }

        Self { gray, rgb }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.gray.ncols()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.gray.nrows()
    }

    /// Export as a packed RGB24 still.
    pub fn to_still(&self) -> StillFrame {
        let (h, w) = (self.height(), self.width());
        let mut rgb = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                for c in 0..3 {
                    rgb.push(self.rgb[[y, x, c]].round().clamp(0.0, 255.0) as u8);
                }
            }
        }
        StillFrame {
            width: w as u32,
            height: h as u32,
            rgb,
        }
    }
}

/// Ordered, bounded sequence of sampled frames for one clip.
///
/// Owned exclusively by the analysis call that created it and discarded once
/// the clip's signals are computed. Length never exceeds the configured
/// sample cap; frames keep source order.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Sampled frames in source order.
    pub frames: Vec<Frame>,
    /// Reported source frame rate (after the 30fps fallback).
    pub source_fps: f64,
}

impl FrameBuffer {
    /// Number of sampled frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no frame was decoded.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Export up to `max` evenly-spaced key frames for secondary engines.
    ///
    /// Skips the first 10% and last 20% of the sampled clip (intros and
    /// outros carry overlays that mislead semantic analysis) when enough
    /// frames exist to afford it.
    pub fn stills(&self, max: usize) -> Vec<StillFrame> {
        if self.frames.is_empty() || max == 0 {
            return Vec::new();
        }

        let n = self.frames.len();
        let (start, end) = if n >= 10 {
            (n / 10, (n * 8) / 10)
        } else {
            (0, n - 1)
        };
        let span = end.saturating_sub(start);
        let count = max.min(span + 1);

        (0..count)
            .map(|i| {
                let idx = if count == 1 {
                    start
                } else {
                    start + (span * i) / (count - 1)
                };
                self.frames[idx].to_still()
            })
            .collect()
    }
}

/// Sample frames from a video file.
///
/// Returns [`DetectError::CannotDecode`] when the file cannot be opened as
/// a video or produces zero decodable frames. An empty buffer is never
/// returned; callers can rely on at least one frame.
pub async fn sample_frames(
    path: impl AsRef<Path>,
    config: &SamplingConfig,
) -> DetectResult<FrameBuffer> {
    let path = path.as_ref();

    let info = probe_video(path).await?;

    which::which("ffmpeg").map_err(|_| DetectError::FfmpegNotFound)?;

    // Analysis resolution: downscale to the configured width, aspect
    // preserved, even height (required by most pixel formats).
    let width = config.analysis_width.min(info.width).max(32);
    let scaled = (info.height as f64 * width as f64 / info.width as f64).round() as u32;
    let height = (scaled & !1).max(2);
    let bytes_per_frame = (width * height * 3) as usize;

    debug!(
        video = %path.display(),
        src_w = info.width,
        src_h = info.height,
        fps = info.fps,
        "sampling frames at {}x{} stride {}",
        width,
        height,
        config.stride
    );

    let select = format!("select=not(mod(n\\,{}))", config.stride);
    let scale = format!("scale={}:{}", width, height);

    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-hide_banner",
        "-loglevel",
        "error",
        "-t",
        &format!("{:.3}", config.max_seconds),
        "-i",
    ])
    .arg(path)
    .args([
        "-vf",
        &format!("{select},{scale}"),
        "-vsync",
        "0",
        "-frames:v",
        &config.max_samples.to_string(),
        "-pix_fmt",
        "rgb24",
        "-f",
        "rawvideo",
        "-",
    ])
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| DetectError::cannot_decode(path, "failed to capture FFmpeg stdout"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| DetectError::cannot_decode(path, "failed to capture FFmpeg stderr"))?;

    // Drain stderr concurrently: a decode that logs more than the OS pipe
    // buffer would otherwise block FFmpeg on the stderr write while we
    // block on stdout, and neither side ever finishes.
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf).await;
        buf
    });

    let mut buffer = Vec::with_capacity(config.max_samples.min(64) * bytes_per_frame);
    stdout.read_to_end(&mut buffer).await?;

    let status = child.wait().await?;
    let stderr_buf = stderr_task.await.unwrap_or_default();
    let frame_count = buffer.len() / bytes_per_frame;

    if frame_count == 0 {
        let stderr_text = String::from_utf8_lossy(&stderr_buf);
        let reason = if stderr_text.trim().is_empty() {
            "no decodable frames".to_string()
        } else {
            format!("no decodable frames: {}", stderr_text.trim())
        };
        return Err(DetectError::cannot_decode(path, reason));
    }

    if !status.success() {
        // Partial decode: keep what we have but record the failure.
        warn!(
            video = %path.display(),
            frames = frame_count,
            "FFmpeg exited non-zero during sampling: {:?}",
            status.code()
        );
    }

    let frames = (0..frame_count)
        .map(|i| {
            let chunk = &buffer[i * bytes_per_frame..(i + 1) * bytes_per_frame];
            Frame::from_rgb24(chunk, width as usize, height as usize)
        })
        .collect();

    Ok(FrameBuffer {
        frames,
        source_fps: info.fps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: usize, height: usize, value: u8) -> Frame {
        Frame::from_rgb24(&vec![value; width * height * 3], width, height)
    }

    #[test]
    fn test_from_rgb24_luma() {
        let frame = solid_frame(4, 2, 200);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        // 0.299 + 0.587 + 0.114 = 1.0, so gray equals the channel value.
        assert!((frame.gray[[0, 0]] - 200.0).abs() < 0.5);
    }

    #[test]
    fn test_to_still_round_trips() {
        let frame = solid_frame(3, 2, 42);
        let still = frame.to_still();
        assert_eq!(still.width, 3);
        assert_eq!(still.height, 2);
        assert!(still.rgb.iter().all(|&b| b == 42));
    }

    #[test]
    fn test_stills_respects_max_and_skip() {
        let buffer = FrameBuffer {
            frames: (0..30).map(|i| solid_frame(2, 2, i as u8)).collect(),
            source_fps: 30.0,
        };
        let stills = buffer.stills(8);
        assert_eq!(stills.len(), 8);
        // First exported frame is at the 10% mark, last at the 80% mark.
        assert_eq!(stills.first().unwrap().rgb[0], 3);
        assert_eq!(stills.last().unwrap().rgb[0], 24);
    }

    #[test]
    fn test_stills_short_clip_uses_all_frames() {
        let buffer = FrameBuffer {
            frames: (0..3).map(|i| solid_frame(2, 2, i as u8)).collect(),
            source_fps: 30.0,
        };
        let stills = buffer.stills(8);
        assert_eq!(stills.len(), 3);
    }

    #[test]
    fn test_stills_empty_buffer() {
        let buffer = FrameBuffer {
            frames: Vec::new(),
            source_fps: 30.0,
        };
        assert!(buffer.stills(8).is_empty());
    }
}
