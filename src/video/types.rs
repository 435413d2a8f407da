use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Represents a single video frame
///
/// This is a simple wrapper around an RGB image buffer that provides
/// convenient methods for the pixel manipulation used by the sway filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        let buffer = ImageBuffer::new(width, height);
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    /// Get the width of the frame
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height of the frame
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let pixel = self.buffer.get_pixel(x, y);
        [pixel[0], pixel[1], pixel[2]]
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Borrow the frame as raw packed RGB bytes (row-major, 3 bytes per pixel)
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Metadata of a video as reported by the codec backend
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Frames per second as reported by the source; may be non-positive
    /// when the container carries no usable rate.
    pub fps: f64,
}

impl VideoMetadata {
    /// Frame rate with the fallback applied for sources that report a
    /// non-positive rate.
    pub fn effective_fps(&self) -> f64 {
        if self.fps > 0.0 {
            self.fps
        } else {
            DEFAULT_FPS
        }
    }
}

/// Fallback frame rate for sources with missing or bogus metadata
pub const DEFAULT_FPS: f64 = 25.0;

/// Parameters for an output video stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamParams {
    pub width: u32,
    pub height: u32,
    pub fps: f64,

    /// Video codec to pass to the encoder
    pub codec: String,

    /// Constant rate factor (0-51, lower is better)
    pub crf: u8,
}

impl StreamParams {
    /// Derive output parameters matching a source video
    pub fn matching(meta: &VideoMetadata) -> Self {
        Self {
            width: meta.width,
            height: meta.height,
            fps: meta.effective_fps(),
            ..Self::default()
        }
    }
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fps: DEFAULT_FPS,
            codec: "libx264".to_string(),
            crf: 18,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip_through_bytes() {
        let mut frame = Frame::new_black(4, 3);
        frame.set_pixel(2, 1, [10, 20, 30]);

        let bytes = frame.as_rgb_bytes().to_vec();
        assert_eq!(bytes.len(), 4 * 3 * 3);

        let restored = Frame::from_rgb_bytes(4, 3, bytes).unwrap();
        assert_eq!(restored.get_pixel(2, 1), [10, 20, 30]);
        assert_eq!(restored.get_pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_from_rgb_bytes_rejects_short_buffer() {
        assert!(Frame::from_rgb_bytes(4, 3, vec![0u8; 5]).is_none());
    }

    #[test]
    fn test_effective_fps_fallback() {
        let meta = VideoMetadata { width: 640, height: 480, fps: 0.0 };
        assert_eq!(meta.effective_fps(), 25.0);

        let meta = VideoMetadata { width: 640, height: 480, fps: 30.0 };
        assert_eq!(meta.effective_fps(), 30.0);
    }
}
