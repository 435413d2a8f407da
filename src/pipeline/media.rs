// src/pipeline/media.rs - ffmpeg invocations for audio fixing and muxing

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::config::{AudioFixConfig, VideoConfig};
use crate::error::{PipelineError, Result};

/// Thin wrapper over the external ffmpeg binary for the mux steps
///
/// The video decode/encode work of the sway filter goes through the frame
/// codec; this type only covers the container-level operations: converting
/// the driven audio to a stable WAV, muxing it back with padding, and
/// re-attaching audio after the sway pass.
pub struct MediaTool {
    ffmpeg: PathBuf,
}

impl MediaTool {
    pub fn new<P: Into<PathBuf>>(ffmpeg: P) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }

    /// Convert the driven audio to PCM WAV so the later mux is deterministic
    /// regardless of the input container.
    pub async fn pad_audio_to_wav(
        &self,
        input: &Path,
        output: &Path,
        cfg: &AudioFixConfig,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-acodec", "pcm_s16le"])
            .args(["-ar", &cfg.sample_rate.to_string()])
            .args(["-ac", &cfg.channels.to_string()])
            .arg(output);

        exec(cmd).await.map_err(|reason| {
            PipelineError::AudioFixFailed {
                reason: format!("wav conversion: {}", reason),
            }
            .into()
        })
    }

    /// Mux `video` with the padded audio: `adelay` start padding plus a
    /// silent `anullsrc` tail concatenated onto the stream, AAC-encoded,
    /// video copied as-is.
    pub async fn mux_with_audio_fix(
        &self,
        video: &Path,
        audio_wav: &Path,
        output: &Path,
        cfg: &AudioFixConfig,
    ) -> Result<()> {
        let filter = build_audio_filter(cfg);
        debug!("Audio mux filter: {}", filter);

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio_wav)
            .args(["-filter_complex", &filter])
            .args(["-map", "0:v:0"])
            .args(["-map", "[aout]"])
            .args(["-c:v", "copy"])
            .args(["-c:a", "aac"])
            .args(["-b:a", &cfg.bitrate])
            .args(["-ar", &cfg.sample_rate.to_string()])
            .args(["-movflags", "+faststart"])
            .arg("-shortest")
            .arg(output);

        exec(cmd).await.map_err(|reason| {
            PipelineError::MuxFailed {
                reason: format!("audio mux: {}", reason),
            }
            .into()
        })
    }

    /// Re-encode the sway pass output and attach the audio track from
    /// `audio_source` unchanged.
    pub async fn remux_sway_video(
        &self,
        sway_video: &Path,
        audio_source: &Path,
        output: &Path,
        cfg: &VideoConfig,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(sway_video)
            .arg("-i")
            .arg(audio_source)
            .args(["-map", "0:v:0"])
            .args(["-map", "1:a:0"])
            .args(["-c:v", &cfg.codec])
            .args(["-preset", &cfg.preset])
            .args(["-crf", &cfg.crf.to_string()])
            .args(["-c:a", "copy"])
            .args(["-movflags", "+faststart"])
            .arg(output);

        exec(cmd).await.map_err(|reason| {
            PipelineError::MuxFailed {
                reason: format!("sway remux: {}", reason),
            }
            .into()
        })
    }
}

/// `adelay` needs one delay value per channel; the silent tail matches the
/// output rate and layout so the concat filter accepts both inputs.
fn build_audio_filter(cfg: &AudioFixConfig) -> String {
    let delays = vec![cfg.start_pad_ms.to_string(); cfg.channels as usize].join("|");
    format!(
        "[1:a]adelay={delays}[aud];anullsrc=r={rate}:cl={layout}:d={tail:.2}[sil];[aud][sil]concat=n=2:v=0:a=1[aout]",
        delays = delays,
        rate = cfg.sample_rate,
        layout = cfg.channel_layout(),
        tail = cfg.tail_sec,
    )
}

async fn exec(mut cmd: Command) -> std::result::Result<(), String> {
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());

    let output = cmd.output().await.map_err(|e| e.to_string())?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("ffmpeg exited with {}: {}", output.status, stderr.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_filter_string() {
        let cfg = AudioFixConfig::default();
        assert_eq!(
            build_audio_filter(&cfg),
            "[1:a]adelay=150|150[aud];anullsrc=r=48000:cl=stereo:d=0.20[sil];\
             [aud][sil]concat=n=2:v=0:a=1[aout]"
        );
    }

    #[test]
    fn test_mono_filter_string() {
        let cfg = AudioFixConfig {
            channels: 1,
            start_pad_ms: 80,
            sample_rate: 44_100,
            tail_sec: 0.5,
            ..AudioFixConfig::default()
        };
        assert_eq!(
            build_audio_filter(&cfg),
            "[1:a]adelay=80[aud];anullsrc=r=44100:cl=mono:d=0.50[sil];[aud][sil]concat=n=2:v=0:a=1[aout]"
        );
    }
}
