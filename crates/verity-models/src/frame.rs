//! Still frames handed to secondary engines.

/// One decoded frame in packed RGB24, row-major.
///
/// Produced by the frame sampler when exporting key frames for secondary
/// engines (e.g. the hosted vision engine). Small by construction: the
/// sampler decodes at analysis resolution, well under typical payload caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Packed RGB24 pixel data, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

impl StillFrame {
    /// Create a still frame, verifying the buffer length matches the
    /// dimensions.
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Option<Self> {
        if rgb.len() == (width as usize) * (height as usize) * 3 {
            Some(Self { width, height, rgb })
        } else {
            None
        }
    }

    /// Expected buffer length for the frame dimensions.
    pub fn expected_len(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * 3
    }
}
