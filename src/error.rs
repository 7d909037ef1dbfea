use thiserror::Error;

/// Main error type for the screen-studio library
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("File sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Video source error: {0}")]
    Video(#[from] VideoError),

    #[error("Background error: {0}")]
    Background(#[from] BackgroundError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Recording session error: {0}")]
    Recording(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Export orchestration errors
///
/// Every variant aborts the whole job; the orchestrator restores the video
/// before surfacing it.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{reason}")]
    Setup { reason: String },

    #[error("Canvas unavailable: {width}x{height} is not a drawable surface")]
    CanvasUnavailable { width: u32, height: u32 },

    #[error("Frame capture failed: {0}")]
    Capture(#[from] RenderError),

    #[error("Encoder failed: {0}")]
    Encoder(#[from] RecorderError),

    #[error("Export produced an empty file")]
    EmptyResult,

    #[error("Could not deliver export: {0}")]
    Delivery(#[from] SinkError),

    #[error("Video playback failed: {0}")]
    Playback(#[from] VideoError),
}

/// Per-frame compositing errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Target surface {width}x{height} has nothing to draw on")]
    EmptySurface { width: u32, height: u32 },

    #[error("Could not read video frame: {0}")]
    Frame(#[from] VideoError),

    #[error("Layout is not drawable: {details}")]
    InvalidLayout { details: String },

    #[error("Image encoding failed: {reason}")]
    Encoding { reason: String },
}

/// Stream recorder and encoder backend errors
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("No encoder could be constructed for {format}: {reason}")]
    Construction { format: String, reason: String },

    #[error("Encoder failed mid-stream: {reason}")]
    Stream { reason: String },

    #[error("Recorder is {state}, cannot {action}")]
    InvalidState { state: String, action: String },

    #[error("No encoder backend handles {format}")]
    NoBackend { format: String },
}

/// File delivery errors
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Refusing to write an empty file: {file_name}")]
    EmptyBlob { file_name: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Video source errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to load video file: {path}")]
    LoadFailed { path: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Playback failed: {reason}")]
    PlaybackFailed { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Backdrop painting errors
#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error("Background not found: {name}")]
    NotFound { name: String },

    #[error("Background image unavailable: {path} - {reason}")]
    ImageUnavailable { path: String, reason: String },

    #[error("Background configuration invalid: {details}")]
    InvalidConfig { details: String },
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

/// Convenience type alias for Results using StudioError
pub type Result<T> = std::result::Result<T, StudioError>;

impl ExportError {
    pub fn setup<S: Into<String>>(reason: S) -> Self {
        Self::Setup { reason: reason.into() }
    }
}

impl StudioError {
    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Sink(SinkError::Write { .. }) => true,
            Self::Export(ExportError::Delivery(SinkError::Write { .. })) => true,
            Self::Video(VideoError::LoadFailed { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Export(ExportError::Setup { reason }) => reason.clone(),
            Self::Export(ExportError::EmptyResult) => {
                "The export finished without producing any video data. Try a different format.".to_string()
            }
            Self::Export(ExportError::Encoder(RecorderError::Construction { format, .. })) => {
                format!("Your system cannot encode {} video. Try another format.", format)
            }
            Self::Video(VideoError::LoadFailed { path }) => {
                format!("Could not load video file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Background(BackgroundError::NotFound { name }) => {
                format!("Background '{}' not found. Run with --list-backgrounds to see the presets.", name)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_message_is_user_facing() {
        let err: StudioError = ExportError::setup("No video available to export").into();
        assert_eq!(err.user_message(), "No video available to export");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_write_failures_are_recoverable() {
        let err: StudioError = SinkError::Write {
            path: "/tmp/out.webm".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(err.is_recoverable());
    }
}
