// src/motion/compositor.rs - Sequential frame loop for the body-sway effect

use std::path::Path;

use tracing::{debug, info, warn};

use crate::codec::{FfmpegCodec, FrameCodec, FrameReader, FrameWriter};
use crate::error::Result;
use crate::motion::{mask::AlphaMask, transform::sway_at, warp::warp_affine, MotionConfig};
use crate::video::StreamParams;

/// Vertical pivot position as a fraction of frame height
const PIVOT_Y_RATIO: f64 = 0.88;

/// What a compositing run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// Effect applied; the destination holds `frames` processed frames
    Applied { frames: u64 },
    /// Configuration opted out; no I/O was performed
    Disabled,
    /// No video backend could be constructed; no I/O was performed
    BackendUnavailable,
}

impl MotionOutcome {
    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Single-pass body-sway compositor over an abstract frame codec
///
/// Strictly sequential: one reader, one writer, frames processed and written
/// in source order. Reader and writer are owned by the frame loop, so every
/// exit path, including per-frame faults, releases both.
pub struct MotionCompositor<'a, C: FrameCodec> {
    codec: &'a C,
    config: &'a MotionConfig,
}

impl<'a, C: FrameCodec> MotionCompositor<'a, C> {
    pub fn new(codec: &'a C, config: &'a MotionConfig) -> Self {
        Self { codec, config }
    }

    /// Run the effect from `input` to `output`.
    ///
    /// `log` receives human-readable progress lines; passing `None` only
    /// silences those, `tracing` output is unaffected.
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        log: Option<&dyn Fn(&str)>,
    ) -> Result<MotionOutcome> {
        if !self.config.enabled {
            return Ok(MotionOutcome::Disabled);
        }
        self.config.validate()?;

        let mut reader = self.codec.open_reader(input)?;
        let meta = reader.metadata().clone();
        let fps = meta.effective_fps();

        let params = StreamParams::matching(&meta);
        let mut writer = self.codec.create_writer(output, &params)?;

        if let Some(log) = log {
            log(&format!(
                "Body sway on: amp={}px rot={}deg scale={}",
                self.config.amplitude_px, self.config.rotate_deg, self.config.scale_amt
            ));
        }
        info!(
            "Sway pass: {}x{} @ {:.3} fps, {} -> {}",
            meta.width,
            meta.height,
            fps,
            input.display(),
            output.display()
        );

        let mask = AlphaMask::build(meta.width, meta.height, self.config);
        let pivot = (meta.width as f64 * 0.5, meta.height as f64 * PIVOT_Y_RATIO);

        let mut index: u64 = 0;
        while let Some(frame) = reader.next_frame()? {
            let sway = sway_at(index, fps, self.config);
            let matrix = sway.to_affine(pivot);

            let warped = warp_affine(&frame, &matrix)?;
            let blended = mask.blend(&warped, &frame);
            writer.write_frame(&blended)?;

            index += 1;
            if index % 100 == 0 {
                debug!("Sway pass: {} frames done", index);
            }
        }

        writer.finish()?;

        if let Some(log) = log {
            log(&format!("Body sway done: {} frames", index));
        }
        Ok(MotionOutcome::Applied { frames: index })
    }
}

/// Apply the body-sway effect using the external ffmpeg backend.
///
/// Degrades gracefully: a disabled config or a missing ffmpeg binary reports
/// a skipped outcome instead of an error, so an enclosing pipeline can keep
/// the unmodified video and continue.
pub fn apply_body_motion(
    input: &Path,
    output: &Path,
    config: &MotionConfig,
    log: Option<&dyn Fn(&str)>,
) -> Result<MotionOutcome> {
    if !config.enabled {
        return Ok(MotionOutcome::Disabled);
    }

    match FfmpegCodec::detect() {
        Some(codec) => MotionCompositor::new(&codec, config).run(input, output, log),
        None => {
            warn!("Body sway skipped: ffmpeg not available");
            if let Some(log) = log {
                log("Body sway skipped: ffmpeg not available");
            }
            Ok(MotionOutcome::BackendUnavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::error::{HeadswayError, VideoError};
    use crate::video::{Frame, VideoMetadata};

    /// In-memory codec recording every interaction
    struct MemCodec {
        frames: Vec<Frame>,
        fps: f64,
        fail_after: Option<usize>,
        opens: Cell<usize>,
        written: Rc<RefCell<Vec<Frame>>>,
        writer_params: Rc<RefCell<Option<StreamParams>>>,
        finished: Rc<Cell<bool>>,
    }

    impl MemCodec {
        fn new(frames: Vec<Frame>, fps: f64) -> Self {
            Self {
                frames,
                fps,
                fail_after: None,
                opens: Cell::new(0),
                written: Rc::new(RefCell::new(Vec::new())),
                writer_params: Rc::new(RefCell::new(None)),
                finished: Rc::new(Cell::new(false)),
            }
        }
    }

    struct MemReader {
        frames: Vec<Frame>,
        next: usize,
        fail_after: Option<usize>,
        meta: VideoMetadata,
    }

    impl FrameReader for MemReader {
        fn metadata(&self) -> &VideoMetadata {
            &self.meta
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if Some(self.next) == self.fail_after {
                return Err(VideoError::DecodeFailed {
                    reason: "injected fault".to_string(),
                }
                .into());
            }
            let frame = self.frames.get(self.next).cloned();
            self.next += 1;
            Ok(frame)
        }
    }

    struct MemWriter {
        written: Rc<RefCell<Vec<Frame>>>,
        finished: Rc<Cell<bool>>,
    }

    impl FrameWriter for MemWriter {
        fn write_frame(&mut self, frame: &Frame) -> Result<()> {
            self.written.borrow_mut().push(frame.clone());
            Ok(())
        }

        fn finish(self) -> Result<()> {
            self.finished.set(true);
            Ok(())
        }
    }

    impl FrameCodec for MemCodec {
        type Reader = MemReader;
        type Writer = MemWriter;

        fn open_reader(&self, _path: &Path) -> Result<Self::Reader> {
            self.opens.set(self.opens.get() + 1);
            let (width, height) = self
                .frames
                .first()
                .map(|f| (f.width(), f.height()))
                .unwrap_or((640, 480));
            Ok(MemReader {
                frames: self.frames.clone(),
                next: 0,
                fail_after: self.fail_after,
                meta: VideoMetadata {
                    width,
                    height,
                    fps: self.fps,
                },
            })
        }

        fn create_writer(&self, _path: &Path, params: &StreamParams) -> Result<Self::Writer> {
            *self.writer_params.borrow_mut() = Some(params.clone());
            Ok(MemWriter {
                written: Rc::clone(&self.written),
                finished: Rc::clone(&self.finished),
            })
        }
    }

    fn enabled_config() -> MotionConfig {
        MotionConfig {
            enabled: true,
            ..MotionConfig::default()
        }
    }

    fn run(codec: &MemCodec, config: &MotionConfig) -> Result<MotionOutcome> {
        MotionCompositor::new(codec, config)
            .run(Path::new("in.mp4"), Path::new("out.mp4"), None)
    }

    #[test]
    fn test_disabled_config_performs_no_io() {
        let codec = MemCodec::new(vec![Frame::new_black(32, 24); 3], 25.0);
        let config = MotionConfig::default(); // disabled

        let outcome = run(&codec, &config).unwrap();
        assert_eq!(outcome, MotionOutcome::Disabled);
        assert_eq!(codec.opens.get(), 0);
        assert!(codec.written.borrow().is_empty());
    }

    #[test]
    fn test_black_video_stays_black() {
        // 10-frame 25 fps 640x480 all-black source: warping a uniform frame
        // with reflective borders changes nothing, so the output must be 10
        // all-black frames of the same size.
        let codec = MemCodec::new(vec![Frame::new_black(640, 480); 10], 25.0);
        let config = enabled_config();

        let outcome = run(&codec, &config).unwrap();
        assert_eq!(outcome, MotionOutcome::Applied { frames: 10 });
        assert!(codec.finished.get());

        let written = codec.written.borrow();
        assert_eq!(written.len(), 10);
        let black = Frame::new_black(640, 480);
        for frame in written.iter() {
            assert_eq!(*frame, black);
        }
    }

    #[test]
    fn test_frame_count_and_order_preserved() {
        let frames: Vec<Frame> = (0..7)
            .map(|i| Frame::new_filled(64, 48, [i * 30, 255 - i * 30, i]))
            .collect();
        let codec = MemCodec::new(frames.clone(), 30.0);

        let outcome = run(&codec, &enabled_config()).unwrap();
        assert_eq!(outcome, MotionOutcome::Applied { frames: 7 });

        // Uniform frames survive warp and blend untouched, so order is
        // directly observable through the fill colors
        let written = codec.written.borrow();
        assert_eq!(written.len(), 7);
        for (out, src) in written.iter().zip(&frames) {
            assert_eq!(out.get_pixel(10, 40), src.get_pixel(10, 40));
        }
    }

    #[test]
    fn test_zero_amplitude_is_identity() {
        let mut frame = Frame::new_black(48, 36);
        for y in 0..36 {
            for x in 0..48 {
                frame.set_pixel(x, y, [(x * 5) as u8, (y * 7) as u8, (x + y) as u8]);
            }
        }
        let codec = MemCodec::new(vec![frame.clone(); 4], 25.0);

        let config = MotionConfig {
            enabled: true,
            amplitude_px: 0.0,
            rotate_deg: 0.0,
            scale_amt: 0.0,
            ..MotionConfig::default()
        };

        run(&codec, &config).unwrap();
        for out in codec.written.borrow().iter() {
            assert_eq!(*out, frame);
        }
    }

    #[test]
    fn test_empty_source_writes_empty_output() {
        let codec = MemCodec::new(Vec::new(), 25.0);

        let outcome = run(&codec, &enabled_config()).unwrap();
        assert_eq!(outcome, MotionOutcome::Applied { frames: 0 });
        assert!(codec.written.borrow().is_empty());
        assert!(codec.finished.get(), "writer must still be finalized");
    }

    #[test]
    fn test_non_positive_fps_falls_back_to_25() {
        let codec = MemCodec::new(vec![Frame::new_black(32, 24); 2], 0.0);

        run(&codec, &enabled_config()).unwrap();
        let params = codec.writer_params.borrow();
        assert_eq!(params.as_ref().unwrap().fps, 25.0);
    }

    #[test]
    fn test_decode_fault_aborts_and_releases_writer() {
        let mut codec = MemCodec::new(vec![Frame::new_black(32, 24); 5], 25.0);
        codec.fail_after = Some(2);

        let err = run(&codec, &enabled_config()).unwrap_err();
        assert!(matches!(
            err,
            HeadswayError::Video(VideoError::DecodeFailed { .. })
        ));

        // Two frames were written before the fault; the writer was dropped
        // without being finalized
        assert_eq!(codec.written.borrow().len(), 2);
        assert!(!codec.finished.get());
    }

    #[test]
    fn test_invalid_config_rejected_before_io() {
        let codec = MemCodec::new(vec![Frame::new_black(32, 24); 2], 25.0);
        let config = MotionConfig {
            enabled: true,
            start_ratio: 2.0,
            ..MotionConfig::default()
        };

        assert!(run(&codec, &config).is_err());
        assert_eq!(codec.opens.get(), 0);
    }
}
