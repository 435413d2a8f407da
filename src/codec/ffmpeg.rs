// src/codec/ffmpeg.rs - External FFmpeg backend for sequential frame I/O

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::{debug, info, warn};

use crate::codec::{FrameCodec, FrameReader, FrameWriter};
use crate::error::{Result, VideoError};
use crate::video::{Frame, StreamParams, VideoMetadata};

/// Frame codec backed by the external `ffmpeg`/`ffprobe` binaries
///
/// Frames travel over rawvideo rgb24 pipes, so decode and encode stay strictly
/// sequential and no intermediate files are written. Construction probes the
/// binary; when it is absent the caller treats the whole capability as
/// unavailable rather than failing the enclosing pipeline.
pub struct FfmpegCodec {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegCodec {
    /// Locate ffmpeg on PATH, returning `None` when it cannot be run
    pub fn detect() -> Option<Self> {
        Self::with_binary("ffmpeg")
    }

    /// Use a specific ffmpeg binary; ffprobe is expected next to it
    pub fn with_binary<P: Into<PathBuf>>(ffmpeg: P) -> Option<Self> {
        let ffmpeg = ffmpeg.into();
        if !Self::is_runnable(&ffmpeg) {
            warn!("ffmpeg not runnable at {:?}", ffmpeg);
            return None;
        }

        let ffprobe = sibling_binary(&ffmpeg, "ffprobe");
        debug!("ffmpeg codec ready: {:?} / {:?}", ffmpeg, ffprobe);
        Some(Self { ffmpeg, ffprobe })
    }

    fn is_runnable(ffmpeg: &Path) -> bool {
        Command::new(ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn probe_metadata(&self, path: &Path) -> Result<VideoMetadata> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .output()
            .map_err(|_| VideoError::SourceUnreadable {
                path: format!("{}: ffprobe failed to run", path.display()),
            })?;

        if !output.status.success() {
            return Err(VideoError::SourceUnreadable {
                path: path.display().to_string(),
            }
            .into());
        }

        let json = String::from_utf8_lossy(&output.stdout).into_owned();
        let width = extract_json_number(&json, "width");
        let height = extract_json_number(&json, "height");

        let (width, height) = match (width, height) {
            (Some(w), Some(h)) if w >= 1.0 && h >= 1.0 => (w as u32, h as u32),
            _ => {
                return Err(VideoError::SourceUnreadable {
                    path: format!("{}: no video stream dimensions", path.display()),
                }
                .into())
            }
        };

        // Missing or bogus rates are kept as reported; the caller applies the
        // 25 fps fallback.
        let fps = extract_fps(&json).unwrap_or(0.0);

        info!("Probed {}: {}x{} @ {:.3} fps", path.display(), width, height, fps);
        Ok(VideoMetadata { width, height, fps })
    }
}

impl FrameCodec for FfmpegCodec {
    type Reader = FfmpegFrameReader;
    type Writer = FfmpegFrameWriter;

    fn open_reader(&self, path: &Path) -> Result<Self::Reader> {
        if !path.exists() {
            return Err(VideoError::SourceUnreadable {
                path: path.display().to_string(),
            }
            .into());
        }

        let meta = self.probe_metadata(path)?;

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VideoError::SourceUnreadable {
                path: format!("{}: {}", path.display(), e),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| VideoError::SourceUnreadable {
            path: format!("{}: no decoder stdout", path.display()),
        })?;

        let frame_len = meta.width as usize * meta.height as usize * 3;
        Ok(FfmpegFrameReader {
            child: Some(child),
            stdout,
            meta,
            frame_len,
        })
    }

    fn create_writer(&self, path: &Path, params: &StreamParams) -> Result<Self::Writer> {
        if params.width == 0 || params.height == 0 || params.fps <= 0.0 {
            return Err(VideoError::InvalidParameters {
                details: format!("{}x{} @ {} fps", params.width, params.height, params.fps),
            }
            .into());
        }

        let mut child = Command::new(&self.ffmpeg)
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-s",
                &format!("{}x{}", params.width, params.height),
                "-r",
                &format!("{}", params.fps),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                &params.codec,
                "-crf",
                &params.crf.to_string(),
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VideoError::DestinationUnwritable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::DestinationUnwritable {
            path: path.display().to_string(),
            reason: "no encoder stdin".to_string(),
        })?;

        Ok(FfmpegFrameWriter {
            child: Some(child),
            stdin: Some(stdin),
            path: path.to_path_buf(),
            frame_len: params.width as usize * params.height as usize * 3,
        })
    }
}

/// Sequential rgb24 frame reader over an ffmpeg decode pipe
pub struct FfmpegFrameReader {
    child: Option<Child>,
    stdout: ChildStdout,
    meta: VideoMetadata,
    frame_len: usize,
}

impl FrameReader for FfmpegFrameReader {
    fn metadata(&self) -> &VideoMetadata {
        &self.meta
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut buf = vec![0u8; self.frame_len];
        let mut filled = 0;

        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(VideoError::DecodeFailed {
                        reason: format!("decoder pipe: {}", e),
                    }
                    .into())
                }
            }
        }

        if filled == 0 {
            // Clean end of stream; reap the decoder
            if let Some(mut child) = self.child.take() {
                let _ = child.wait();
            }
            return Ok(None);
        }

        if filled < buf.len() {
            return Err(VideoError::DecodeFailed {
                reason: format!("truncated frame: {} of {} bytes", filled, buf.len()),
            }
            .into());
        }

        Frame::from_rgb_bytes(self.meta.width, self.meta.height, buf)
            .ok_or_else(|| {
                VideoError::DecodeFailed {
                    reason: "frame buffer size mismatch".to_string(),
                }
                .into()
            })
            .map(Some)
    }
}

impl Drop for FfmpegFrameReader {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Sequential rgb24 frame writer into an ffmpeg encode pipe
pub struct FfmpegFrameWriter {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    path: PathBuf,
    frame_len: usize,
}

impl FrameWriter for FfmpegFrameWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.as_rgb_bytes();
        if bytes.len() != self.frame_len {
            return Err(VideoError::FrameProcessingFailed {
                reason: format!(
                    "frame size {} does not match stream size {}",
                    bytes.len(),
                    self.frame_len
                ),
            }
            .into());
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::FrameProcessingFailed {
            reason: "encoder already finished".to_string(),
        })?;

        stdin.write_all(bytes).map_err(|e| {
            VideoError::FrameProcessingFailed {
                reason: format!("encoder pipe: {}", e),
            }
            .into()
        })
    }

    fn finish(mut self) -> Result<()> {
        // Closing stdin signals end of stream to the encoder
        drop(self.stdin.take());

        let child = self.child.take().ok_or_else(|| VideoError::DestinationUnwritable {
            path: self.path.display().to_string(),
            reason: "encoder already reaped".to_string(),
        })?;

        let output = child.wait_with_output().map_err(|e| VideoError::DestinationUnwritable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::DestinationUnwritable {
                path: self.path.display().to_string(),
                reason: format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
            }
            .into());
        }

        debug!("Encoder finalized: {}", self.path.display());
        Ok(())
    }
}

impl Drop for FfmpegFrameWriter {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn sibling_binary(ffmpeg: &Path, name: &str) -> PathBuf {
    let file = match ffmpeg.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", name, ext),
        None => name.to_string(),
    };
    match ffmpeg.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from(file),
        Some(parent) => parent.join(file),
        None => PathBuf::from(file),
    }
}

// ffprobe JSON is shallow enough that pulling two numbers out by hand beats
// carrying a JSON dependency for it.
fn extract_json_number(json: &str, key: &str) -> Option<f64> {
    let pattern = format!("\"{}\":", key);
    let start = json.find(&pattern)? + pattern.len();
    let remaining = json[start..].trim_start().trim_start_matches('"');
    let end = remaining
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
        .unwrap_or(remaining.len());
    remaining[..end].trim_end_matches('"').parse().ok()
}

fn extract_fps(json: &str) -> Option<f64> {
    let start = json.find("\"avg_frame_rate\":")? + "\"avg_frame_rate\":".len();
    let remaining = json[start..].trim_start().trim_start_matches('"');
    let end = remaining.find('"')?;
    let rate = &remaining[..end];

    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "width": 640,
                "height": 480,
                "avg_frame_rate": "30000/1001",
                "duration": "10.427"
            }
        ]
    }"#;

    #[test]
    fn test_extract_dimensions() {
        assert_eq!(extract_json_number(SAMPLE, "width"), Some(640.0));
        assert_eq!(extract_json_number(SAMPLE, "height"), Some(480.0));
        assert_eq!(extract_json_number(SAMPLE, "missing"), None);
    }

    #[test]
    fn test_extract_fps_rational() {
        let fps = extract_fps(SAMPLE).unwrap();
        assert!((fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_extract_fps_zero_denominator() {
        let json = r#"{"avg_frame_rate": "0/0"}"#;
        assert_eq!(extract_fps(json), None);
    }

    #[test]
    fn test_sibling_binary_paths() {
        assert_eq!(sibling_binary(Path::new("ffmpeg"), "ffprobe"), PathBuf::from("ffprobe"));
        assert_eq!(
            sibling_binary(Path::new("/opt/tools/ffmpeg"), "ffprobe"),
            PathBuf::from("/opt/tools/ffprobe")
        );
        assert_eq!(
            sibling_binary(Path::new("C:/tools/ffmpeg.exe"), "ffprobe"),
            PathBuf::from("C:/tools/ffprobe.exe")
        );
    }
}
