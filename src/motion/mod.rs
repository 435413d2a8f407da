//! # Body-Sway Motion Filter
//!
//! Synthesizes a subtle breathing/swaying illusion on an otherwise static
//! talking-head video. Each frame is warped by a small time-parameterized
//! affine transform and blended back against the original frame through a
//! vertical feather mask, so only the lower body region appears to move.
//!
//! The per-frame transform is a pure function of the frame index, the frame
//! rate, and the configuration ([`transform::sway_at`]); the mask is built
//! once per run ([`mask::AlphaMask`]); the frame loop lives in
//! [`compositor::MotionCompositor`].

pub mod compositor;
pub mod mask;
pub mod transform;
pub mod warp;

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};

pub use compositor::{apply_body_motion, MotionCompositor, MotionOutcome};
pub use mask::AlphaMask;
pub use transform::{sway_at, Affine2x3, SwayTransform};

/// Frame region the sway effect is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SwayRegion {
    /// Everything below `start_ratio` of the frame height
    #[default]
    Lower,
}

/// Configuration for one body-sway compositing run
///
/// Immutable once constructed. Amplitudes are deliberately tiny; the effect
/// should read as breathing, not as camera shake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Whether the effect runs at all
    pub enabled: bool,

    /// Pixel displacement scale
    pub amplitude_px: f64,

    /// Primary oscillation frequency in Hz
    pub freq_hz: f64,

    /// Maximum rotation amplitude in degrees
    pub rotate_deg: f64,

    /// Fractional scale amplitude
    pub scale_amt: f64,

    /// Region the effect applies to
    pub region: SwayRegion,

    /// Blur radius softening the mask edge; 0 leaves a hard step
    pub feather_px: u32,

    /// Fraction of the frame height above which the effect is fully absent
    pub start_ratio: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            amplitude_px: 2.0,
            freq_hz: 0.18,
            rotate_deg: 0.35,
            scale_amt: 0.009,
            region: SwayRegion::Lower,
            feather_px: 64,
            start_ratio: 0.32,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.start_ratio) {
            return Err(MotionError::InvalidConfig {
                details: format!("start_ratio {} outside [0, 1]", self.start_ratio),
            }
            .into());
        }

        if self.freq_hz <= 0.0 {
            return Err(MotionError::InvalidConfig {
                details: format!("freq_hz {} must be positive", self.freq_hz),
            }
            .into());
        }

        for (name, value) in [
            ("amplitude_px", self.amplitude_px),
            ("rotate_deg", self.rotate_deg),
            ("scale_amt", self.scale_amt),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(MotionError::InvalidConfig {
                    details: format!("{} {} must be finite and non-negative", name, value),
                }
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_and_disabled() {
        let config = MotionConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.enabled);
        assert_eq!(config.feather_px, 64);
    }

    #[test]
    fn test_start_ratio_out_of_range_rejected() {
        let config = MotionConfig {
            start_ratio: 1.5,
            ..MotionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_frequency_rejected() {
        let config = MotionConfig {
            freq_hz: 0.0,
            ..MotionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
