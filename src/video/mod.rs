//! Frame and stream types shared by the codec backend and the sway filter.

pub mod types;

pub use types::{Frame, StreamParams, VideoMetadata, DEFAULT_FPS};
