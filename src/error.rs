use thiserror::Error;

/// Main error type for the Headsway library
#[derive(Error, Debug)]
pub enum HeadswayError {
    #[error("Motion processing error: {0}")]
    Motion(#[from] MotionError),

    #[error("Video I/O error: {0}")]
    Video(#[from] VideoError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors from the body-sway motion compositor
#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Invalid motion configuration: {details}")]
    InvalidConfig { details: String },

    #[error("Degenerate affine transform (scale {scale})")]
    DegenerateTransform { scale: f64 },
}

/// Errors from the frame codec layer
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Cannot open source video: {path}")]
    SourceUnreadable { path: String },

    #[error("Cannot create destination video: {path} - {reason}")]
    DestinationUnwritable { path: String, reason: String },

    #[error("Frame decode failed: {reason}")]
    DecodeFailed { reason: String },

    #[error("Frame processing failed: {reason}")]
    FrameProcessingFailed { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Errors from the generator/mux orchestration pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Required tool not found: {name} at {path}")]
    ToolMissing { name: String, path: String },

    #[error("Input file not found: {path}")]
    InputMissing { path: String },

    #[error("Generator run failed: {reason}")]
    GeneratorFailed { reason: String },

    #[error("Generator produced no mp4 under: {dir}")]
    OutputNotFound { dir: String },

    #[error("Audio fix failed: {reason}")]
    AudioFixFailed { reason: String },

    #[error("Mux failed: {reason}")]
    MuxFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using HeadswayError
pub type Result<T> = std::result::Result<T, HeadswayError>;

impl HeadswayError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // A locked or still-being-written source might open on retry
            Self::Video(VideoError::SourceUnreadable { .. }) => true,
            // Most other errors are permanent
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::SourceUnreadable { path }) => {
                format!("Could not open video '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Pipeline(PipelineError::ToolMissing { name, path }) => {
                format!("'{}' was not found at '{}'. Please check the tool paths.", name, path)
            }
            Self::Pipeline(PipelineError::OutputNotFound { dir }) => {
                format!("The generator finished but left no mp4 under '{}'.", dir)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
