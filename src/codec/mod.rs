//! # Frame Codec Capability
//!
//! Abstract interface over sequential video decode and encode. The sway
//! compositor only needs three things from a backend: metadata for the source,
//! frames in order, and a writer that accepts frames in order. Keeping that
//! behind a trait lets the filter degrade to "skipped" when no backend can be
//! constructed, and lets tests run against an in-memory codec.

pub mod ffmpeg;

use std::path::Path;

use crate::error::Result;
use crate::video::{Frame, StreamParams, VideoMetadata};

/// A video I/O backend capable of sequential decode and encode
pub trait FrameCodec {
    type Reader: FrameReader;
    type Writer: FrameWriter;

    /// Open a source video for sequential frame reading
    fn open_reader(&self, path: &Path) -> Result<Self::Reader>;

    /// Create a destination video accepting frames in order
    fn create_writer(&self, path: &Path, params: &StreamParams) -> Result<Self::Writer>;
}

/// Sequential frame source
pub trait FrameReader {
    /// Metadata of the opened video
    fn metadata(&self) -> &VideoMetadata;

    /// Decode the next frame, or `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Sequential frame sink
///
/// Implementations must release their underlying resources on drop so that a
/// failed compositing run never leaks an encoder process or file handle.
pub trait FrameWriter {
    /// Append a frame to the output stream
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and finalize the output
    fn finish(self) -> Result<()>
    where
        Self: Sized;
}

pub use ffmpeg::FfmpegCodec;
