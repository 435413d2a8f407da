//! Pure per-frame sway transform computation.
//!
//! Isolated from all image I/O so the oscillator math can be tested as a
//! plain function of `(frame index, fps, config)`.

use std::f64::consts::PI;

use crate::error::{MotionError, Result};
use crate::motion::MotionConfig;

/// Transform parameters for a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwayTransform {
    /// Horizontal displacement in pixels
    pub dx: f64,
    /// Vertical displacement in pixels
    pub dy: f64,
    /// Rotation in degrees, counter-clockwise positive
    pub angle_deg: f64,
    /// Uniform scale factor around the pivot
    pub scale: f64,
}

/// Compute the sway transform for frame `index` at the given frame rate.
///
/// Deterministic: identical inputs always produce bit-identical output. The
/// primary oscillator drives vertical motion; the lateral, rotational and
/// scale oscillators run at detuned frequencies and phases so the combined
/// motion never settles into a visible loop.
pub fn sway_at(index: u64, fps: f64, cfg: &MotionConfig) -> SwayTransform {
    let t = index as f64 / fps;
    let breath = (2.0 * PI * cfg.freq_hz * t + 0.8).sin();

    let dx = (cfg.amplitude_px * 0.35) * (2.0 * PI * (cfg.freq_hz * 1.9) * t + 0.2).sin();
    let dy = (cfg.amplitude_px * 1.35) * breath;

    let angle_deg = cfg.rotate_deg * (2.0 * PI * (cfg.freq_hz * 0.9) * t + 0.4).sin();
    let scale = 1.0
        + cfg.scale_amt * (0.65 * breath + 0.35 * (2.0 * PI * (cfg.freq_hz * 0.5) * t + 1.3).sin());

    SwayTransform { dx, dy, angle_deg, scale }
}

impl SwayTransform {
    /// Build the 2x3 affine matrix for this transform around `pivot`.
    ///
    /// Rotation and scale are applied about the pivot first, then the
    /// displacement is added to the translation column.
    pub fn to_affine(&self, pivot: (f64, f64)) -> Affine2x3 {
        let mut m = Affine2x3::rotation(pivot, self.angle_deg, self.scale);
        m.m[0][2] += self.dx;
        m.m[1][2] += self.dy;
        m
    }
}

/// Row-major 2x3 affine matrix mapping source to destination coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2x3 {
    pub m: [[f64; 3]; 2],
}

impl Affine2x3 {
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        }
    }

    /// Rotation by `angle_deg` (counter-clockwise) and uniform `scale` about
    /// `center`, matching the conventional image rotation matrix:
    ///
    /// ```text
    /// |  a  b  (1-a)*cx - b*cy |
    /// | -b  a  b*cx + (1-a)*cy |
    /// ```
    ///
    /// with `a = scale*cos(angle)`, `b = scale*sin(angle)`.
    pub fn rotation(center: (f64, f64), angle_deg: f64, scale: f64) -> Self {
        let angle = angle_deg.to_radians();
        let a = scale * angle.cos();
        let b = scale * angle.sin();
        let (cx, cy) = center;

        Self {
            m: [
                [a, b, (1.0 - a) * cx - b * cy],
                [-b, a, b * cx + (1.0 - a) * cy],
            ],
        }
    }

    /// Map a point through the transform
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.m[0][0] * x + self.m[0][1] * y + self.m[0][2],
            self.m[1][0] * x + self.m[1][1] * y + self.m[1][2],
        )
    }

    /// Invert the transform, for inverse-mapped warping
    pub fn invert(&self) -> Result<Affine2x3> {
        let det = self.m[0][0] * self.m[1][1] - self.m[0][1] * self.m[1][0];
        if det.abs() < 1e-12 {
            return Err(MotionError::DegenerateTransform {
                scale: det.abs().sqrt(),
            }
            .into());
        }

        let inv00 = self.m[1][1] / det;
        let inv01 = -self.m[0][1] / det;
        let inv10 = -self.m[1][0] / det;
        let inv11 = self.m[0][0] / det;

        Ok(Affine2x3 {
            m: [
                [inv00, inv01, -(inv00 * self.m[0][2] + inv01 * self.m[1][2])],
                [inv10, inv11, -(inv10 * self.m[0][2] + inv11 * self.m[1][2])],
            ],
        })
    }
}
