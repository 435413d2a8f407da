//! # Headsway
//!
//! Drive a talking-head video generator from a photo and an audio clip, then
//! finish the result: repaired audio and an optional subtle body-sway effect
//! that keeps still portraits from looking frozen.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use headsway::{
//!     config::Config,
//!     pipeline::{JobRequest, PipelineRunner, ToolPaths},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let tools = ToolPaths::new(
//!     "/opt/generator/venv/bin/python",
//!     "/opt/generator",
//!     "ffmpeg",
//!     "renders/",
//! );
//!
//! let mut config = Config::default();
//! config.motion.enabled = true;
//!
//! let runner = PipelineRunner::new(tools, config);
//! let job = JobRequest::new("face.png", "speech.wav");
//! let video = runner.run_job(&job, |line| println!("{line}")).await?;
//! println!("Final video: {}", video.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`pipeline`] - Generator orchestration, audio fix, output discovery
//! - [`motion`] - The body-sway compositor (affine warp + lower-body mask)
//! - [`codec`] - Frame-stream decode/encode backends (ffmpeg rawvideo pipes)
//! - [`video`] - Frame and stream parameter types
//! - [`config`] - Configuration management
//!
//! The sway pass can also be used standalone on any existing video via
//! [`motion::apply_body_motion`].

pub mod codec;
pub mod config;
pub mod error;
pub mod motion;
pub mod pipeline;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{HeadswayError, Result},
    motion::{apply_body_motion, MotionConfig, MotionOutcome},
    pipeline::{JobRequest, PipelineRunner, ToolPaths},
};
