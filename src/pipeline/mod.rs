//! Job orchestration: the generator subprocess, audio repair, and the
//! body-sway pass, glued together end to end.
//!
//! The flow mirrors how someone would run the steps by hand:
//!
//! 1. Invoke the talking-head generator on an image + audio pair
//! 2. Find the mp4 it produced (newest one under its result directory)
//! 3. Fix the audio: small start delay, silent tail, AAC remux
//! 4. Optionally warp in subtle body sway and splice the audio back
//!
//! [`PipelineRunner::run_job`] is the single entry point; everything else
//! here supports it.

pub mod media;
pub mod paths;
pub mod runner;

pub use media::MediaTool;
pub use paths::ToolPaths;
pub use runner::{newest_mp4, JobRequest, PipelineRunner};
