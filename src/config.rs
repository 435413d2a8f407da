use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    error::{ConfigError, Result},
    motion::MotionConfig,
};

/// Main configuration for Headsway
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Body-sway effect settings
    pub motion: MotionConfig,

    /// Audio padding and mux settings
    pub audio_fix: AudioFixConfig,

    /// Re-encode settings for the sway pass
    pub video: VideoConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|_| ConfigError::ParseFailed {
            path: path.display().to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.motion.validate()?;
        self.audio_fix.validate()?;
        self.video.validate()?;
        Ok(())
    }
}

/// Audio-fix policy: pad the start so the first word survives encoder
/// priming, append a short silent tail, and re-encode to AAC.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFixConfig {
    /// Leading silence in milliseconds
    pub start_pad_ms: u32,

    /// Trailing silence in seconds
    pub tail_sec: f64,

    /// Output sample rate (Hz)
    pub sample_rate: u32,

    /// Output channel count (1 or 2)
    pub channels: u8,

    /// AAC bitrate passed to the encoder
    pub bitrate: String,
}

impl Default for AudioFixConfig {
    fn default() -> Self {
        Self {
            start_pad_ms: 150,
            tail_sec: 0.20,
            sample_rate: 48_000,
            channels: 2,
            bitrate: "192k".to_string(),
        }
    }
}

impl AudioFixConfig {
    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                key: "audio_fix.sample_rate".to_string(),
                value: self.sample_rate.to_string(),
            }
            .into());
        }

        if !(1..=2).contains(&self.channels) {
            return Err(ConfigError::InvalidValue {
                key: "audio_fix.channels".to_string(),
                value: self.channels.to_string(),
            }
            .into());
        }

        if self.tail_sec < 0.0 || !self.tail_sec.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "audio_fix.tail_sec".to_string(),
                value: self.tail_sec.to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// ffmpeg channel layout name for `anullsrc`
    pub fn channel_layout(&self) -> &'static str {
        if self.channels == 1 {
            "mono"
        } else {
            "stereo"
        }
    }
}

/// Encoder settings for the sway re-encode pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Video codec for re-encoding
    pub codec: String,

    /// x264 preset
    pub preset: String,

    /// Constant rate factor (0-51, lower is better)
    pub crf: u8,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 18,
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.crf > 51 {
            return Err(ConfigError::InvalidValue {
                key: "video.crf".to_string(),
                value: self.crf.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
