use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::SystemTime;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{PipelineError, Result},
    motion::{apply_body_motion, MotionOutcome},
    pipeline::{media::MediaTool, paths::ToolPaths},
};

/// One generation request: a still photo plus the audio that drives it
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub image: PathBuf,
    pub audio: PathBuf,

    /// Keep the head pose still (recommended for photos)
    pub still: bool,

    /// Generator preprocess mode (`full`, `crop`, ...)
    pub preprocess: String,
}

impl JobRequest {
    pub fn new<P: Into<PathBuf>>(image: P, audio: P) -> Self {
        Self {
            image: image.into(),
            audio: audio.into(),
            still: true,
            preprocess: "full".to_string(),
        }
    }
}

/// Orchestrates the whole flow: generator run, output discovery, audio fix,
/// and the optional body-sway pass.
///
/// Every failure of the sway pass degrades to "effect not applied": the
/// pipeline keeps the unmodified video and continues, because a finished
/// talking-head video without sway beats no video at all.
pub struct PipelineRunner {
    tools: ToolPaths,
    config: Config,
    media: MediaTool,
}

impl PipelineRunner {
    pub fn new(tools: ToolPaths, config: Config) -> Self {
        let media = MediaTool::new(tools.ffmpeg.clone());
        Self { tools, config, media }
    }

    /// Run a full job; returns the path of the final video.
    ///
    /// `log` receives the generator's live output and progress lines, the
    /// same stream a front end would show the user.
    pub async fn run_job(&self, job: &JobRequest, log: impl Fn(&str)) -> Result<PathBuf> {
        self.tools.ensure()?;
        self.config.validate()?;

        for input in [&job.image, &job.audio] {
            if !input.exists() {
                return Err(PipelineError::InputMissing {
                    path: input.display().to_string(),
                }
                .into());
            }
        }

        let result_dir = self.tools.output_dir.join("generator_raw");
        std::fs::create_dir_all(&result_dir)?;

        log(&format!(
            "[INFO] Running generator...\n  IMG={}\n  AUD={}\n  OUT={}",
            job.image.display(),
            job.audio.display(),
            result_dir.display()
        ));
        self.run_generator(job, &result_dir, &log).await?;

        let raw = newest_mp4(&result_dir).ok_or_else(|| PipelineError::OutputNotFound {
            dir: result_dir.display().to_string(),
        })?;
        log(&format!("[OK] Generator produced: {}", raw.display()));

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let fixed = self.tools.output_dir.join(format!("FINAL_fixed_{}.mp4", stamp));
        let tmp_wav = self.tools.output_dir.join(format!("_tmp_padded_{}.wav", stamp));

        log(&format!(
            "Audio fix: start pad {}ms + tail pad {:.2}s",
            self.config.audio_fix.start_pad_ms, self.config.audio_fix.tail_sec
        ));
        let mux = async {
            self.media
                .pad_audio_to_wav(&job.audio, &tmp_wav, &self.config.audio_fix)
                .await?;
            self.media
                .mux_with_audio_fix(&raw, &tmp_wav, &fixed, &self.config.audio_fix)
                .await
        }
        .await;
        let _ = std::fs::remove_file(&tmp_wav);
        mux?;

        if self.config.motion.enabled {
            log("Body sway: enabled (micro shoulder sway)");
            self.run_sway_pass(&fixed, &stamp, &log).await?;
        }

        log(&format!("[DONE] Final video: {}", fixed.display()));
        Ok(fixed)
    }

    async fn run_generator(
        &self,
        job: &JobRequest,
        result_dir: &Path,
        log: &impl Fn(&str),
    ) -> Result<()> {
        let script = self.tools.inference_script();

        let mut cmd = tokio::process::Command::new(&self.tools.generator_python);
        cmd.arg(&script)
            .arg("--driven_audio")
            .arg(&job.audio)
            .arg("--source_image")
            .arg(&job.image)
            .arg("--result_dir")
            .arg(result_dir)
            .arg("--preprocess")
            .arg(&job.preprocess);
        if job.still {
            cmd.arg("--still");
        }
        cmd.current_dir(&self.tools.generator_dir);

        // The generator shells out to ffmpeg internally; make sure it finds
        // the same binary we use
        if let Some(dir) = self.tools.ffmpeg.parent().filter(|p| !p.as_os_str().is_empty()) {
            let mut paths = vec![dir.to_path_buf()];
            paths.extend(std::env::split_paths(&std::env::var_os("PATH").unwrap_or_default()));
            if let Ok(joined) = std::env::join_paths(paths) {
                cmd.env("PATH", joined);
            }
        }

        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!("Spawning generator: {:?}", cmd);
        let mut child = cmd.spawn().map_err(|e| PipelineError::GeneratorFailed {
            reason: format!("spawn failed: {}", e),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut out_lines = stdout.map(|s| BufReader::new(s).lines());
        let mut err_lines = stderr.map(|s| BufReader::new(s).lines());

        // Stream both pipes live into the log until the generator closes them
        loop {
            tokio::select! {
                line = next_line(&mut out_lines) => match line? {
                    Some(l) => log(&l),
                    None => { out_lines = None; }
                },
                line = next_line(&mut err_lines) => match line? {
                    Some(l) => log(&l),
                    None => { err_lines = None; }
                },
                else => break,
            }
            if out_lines.is_none() && err_lines.is_none() {
                break;
            }
        }

        let status = child.wait().await.map_err(|e| PipelineError::GeneratorFailed {
            reason: format!("wait failed: {}", e),
        })?;
        if !status.success() {
            return Err(PipelineError::GeneratorFailed {
                reason: format!("exited with {}", status),
            }
            .into());
        }

        info!("Generator run complete");
        Ok(())
    }

    /// Run the body-sway compositor and splice the audio back. Any failure
    /// here leaves `fixed` untouched.
    async fn run_sway_pass(&self, fixed: &Path, stamp: &str, log: &impl Fn(&str)) -> Result<()> {
        let bm_video = self.tools.output_dir.join(format!("_tmp_bm_video_{}.mp4", stamp));
        let bm_muxed = self.tools.output_dir.join(format!("_tmp_bm_muxed_{}.mp4", stamp));

        let motion_cfg = self.config.motion.clone();
        let (input, output) = (fixed.to_path_buf(), bm_video.clone());
        let outcome = tokio::task::spawn_blocking(move || {
            apply_body_motion(&input, &output, &motion_cfg, None)
        })
        .await
        .map_err(|e| PipelineError::GeneratorFailed {
            reason: format!("sway task panicked: {}", e),
        })?;

        match outcome {
            Ok(MotionOutcome::Applied { frames }) => {
                log(&format!("Body sway applied: {} frames", frames));
                match self
                    .media
                    .remux_sway_video(&bm_video, fixed, &bm_muxed, &self.config.video)
                    .await
                {
                    Ok(()) => {
                        std::fs::rename(&bm_muxed, fixed)?;
                    }
                    Err(e) => {
                        warn!("Body sway remux failed, keeping plain video: {}", e);
                        log("Body sway skipped: ffmpeg mux failed");
                    }
                }
            }
            Ok(MotionOutcome::BackendUnavailable) => {
                log("Body sway skipped: ffmpeg not available");
            }
            Ok(MotionOutcome::Disabled) => {}
            Err(e) => {
                // Effect not applied; the fixed video stands
                warn!("Body sway failed, keeping plain video: {}", e);
                log(&format!("Body sway skipped: {}", e));
            }
        }

        let _ = std::fs::remove_file(&bm_video);
        let _ = std::fs::remove_file(&bm_muxed);
        Ok(())
    }
}

async fn next_line(
    lines: &mut Option<tokio::io::Lines<BufReader<impl tokio::io::AsyncRead + Unpin>>>,
) -> Result<Option<String>> {
    match lines {
        Some(lines) => lines.next_line().await.map_err(|e| {
            PipelineError::GeneratorFailed {
                reason: format!("log stream: {}", e),
            }
            .into()
        }),
        // Pending forever so the other select arm keeps draining
        None => std::future::pending().await,
    }
}

/// Newest `.mp4` under `dir`, searched recursively by modification time.
/// The generator sometimes leaves intermediate mp4s behind; the newest one
/// is the finished render.
pub fn newest_mp4(dir: &Path) -> Option<PathBuf> {
    let mut best: Option<(SystemTime, PathBuf)> = None;
    walk_mp4s(dir, &mut best);
    best.map(|(_, path)| path)
}

fn walk_mp4s(dir: &Path, best: &mut Option<(SystemTime, PathBuf)>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_mp4s(&path, best);
            continue;
        }

        let is_mp4 = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("mp4"))
            .unwrap_or(false);
        if !is_mp4 {
            continue;
        }

        let mtime = match entry.metadata().and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(_) => continue,
        };

        match best {
            Some((t, _)) if *t >= mtime => {}
            _ => *best = Some((mtime, path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_newest_mp4_empty_dir() {
        let dir = tempdir().unwrap();
        assert_eq!(newest_mp4(dir.path()), None);
    }

    #[test]
    fn test_newest_mp4_picks_latest_recursively() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("2024_01_01");
        std::fs::create_dir(&nested).unwrap();

        std::fs::write(dir.path().join("old.mp4"), "a").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        std::fs::write(nested.join("ignored.txt"), "b").unwrap();
        std::fs::write(nested.join("new.mp4"), "c").unwrap();

        let newest = newest_mp4(dir.path()).unwrap();
        assert_eq!(newest, nested.join("new.mp4"));
    }

    #[test]
    fn test_newest_mp4_ignores_other_extensions() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), "a").unwrap();
        std::fs::write(dir.path().join("b.png"), "b").unwrap();
        assert_eq!(newest_mp4(dir.path()), None);
    }

    #[test]
    fn test_job_request_defaults() {
        let job = JobRequest::new("face.png", "speech.wav");
        assert!(job.still);
        assert_eq!(job.preprocess, "full");
    }
}
