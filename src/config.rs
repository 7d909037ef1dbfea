use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    composition::QualityTier,
    error::{ConfigError, Result},
    recorder::ExportFormat,
};

/// Main configuration for screen-studio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Export timing and defaults
    pub export: ExportConfig,

    /// Styled container settings
    pub compositor: CompositorConfig,

    /// Encoder tool locations
    pub recorder: RecorderConfig,

    /// Where finished files go
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.export.validate()?;
        self.compositor.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Export loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Capture rate for video formats
    pub fps: u32,

    /// Capture rate for animated GIFs
    pub gif_fps: u32,

    /// How often progress is sampled (milliseconds)
    pub progress_interval_ms: u64,

    /// Extra time past the clip duration before capture is forced to stop
    pub safety_margin_secs: f64,

    /// Wait after playback ends so the encoder sees the last frames
    pub finalize_delay_ms: u64,

    /// Capture limit for clips that report no finite duration
    pub unknown_duration_limit_secs: f64,

    pub default_format: ExportFormat,

    pub default_quality: QualityTier,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            gif_fps: 15,
            progress_interval_ms: 500,
            safety_margin_secs: 5.0,
            finalize_delay_ms: 500,
            unknown_duration_limit_secs: 600.0,
            default_format: ExportFormat::Webm,
            default_quality: QualityTier::Hd1080,
        }
    }
}

impl ExportConfig {
    pub fn fps_for(&self, format: ExportFormat) -> u32 {
        match format {
            ExportFormat::Gif => self.gif_fps,
            _ => self.fps,
        }
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn finalize_delay(&self) -> Duration {
        Duration::from_millis(self.finalize_delay_ms)
    }

    /// Hard stop for capturing a clip of `duration` seconds
    pub fn safety_limit(&self, duration: f64) -> Duration {
        if duration.is_finite() && duration >= 0.0 {
            Duration::try_from_secs_f64(duration + self.safety_margin_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::try_from_secs_f64(self.unknown_duration_limit_secs).unwrap_or(Duration::MAX)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.fps == 0 || self.fps > 240 {
            return Err(invalid("export.fps", self.fps).into());
        }

        if self.gif_fps == 0 || self.gif_fps > 50 {
            return Err(invalid("export.gif_fps", self.gif_fps).into());
        }

        if self.progress_interval_ms == 0 {
            return Err(invalid("export.progress_interval_ms", self.progress_interval_ms).into());
        }

        if !self.safety_margin_secs.is_finite() || self.safety_margin_secs < 0.0 {
            return Err(invalid("export.safety_margin_secs", self.safety_margin_secs).into());
        }

        if !self.unknown_duration_limit_secs.is_finite() || self.unknown_duration_limit_secs <= 0.0 {
            return Err(invalid("export.unknown_duration_limit_secs", self.unknown_duration_limit_secs).into());
        }

        Ok(())
    }
}

/// Styled container configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Backdrop preset or registered name
    pub background: String,

    /// Optional picture file used instead of a preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<PathBuf>,

    /// Padding around the video in layout pixels
    pub padding: f64,

    pub corner_radius: f64,

    /// Width of the container when no editor layout is available
    pub preview_width: f64,

    /// Colour painted under the backdrop, `#rrggbb` or `#rrggbbaa`
    pub base_color: String,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            background: "preset-3".to_string(),
            background_image: None,
            padding: 40.0,
            corner_radius: 12.0,
            preview_width: 720.0,
            base_color: "#ffffff".to_string(),
        }
    }
}

impl CompositorConfig {
    fn validate(&self) -> Result<()> {
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(invalid("compositor.padding", self.padding).into());
        }

        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 {
            return Err(invalid("compositor.corner_radius", self.corner_radius).into());
        }

        if !self.preview_width.is_finite() || self.preview_width <= 2.0 * self.padding {
            return Err(invalid("compositor.preview_width", self.preview_width).into());
        }

        if crate::backgrounds::palette::parse_hex(&self.base_color).is_none() {
            return Err(invalid("compositor.base_color", &self.base_color).into());
        }

        Ok(())
    }
}

/// External encoder tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

/// Output location configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Fallback directory for exports and raw recordings
    pub download_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.export.default_quality = QualityTier::Uhd2160;
        original_config.compositor.background_image = Some(PathBuf::from("wallpaper.png"));

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[export]\nfps = 30\ndefault_quality = \"720p\"\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.export.fps, 30);
        assert_eq!(config.export.gif_fps, 15);
        assert_eq!(config.export.default_quality, QualityTier::Hd720);
        assert_eq!(config.recorder.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_fps() {
        let mut config = Config::default();
        config.export.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_color() {
        let mut config = Config::default();
        config.compositor.base_color = "white".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_safety_limit() {
        let config = ExportConfig::default();
        assert_eq!(config.safety_limit(10.0), Duration::from_secs(15));
        assert_eq!(config.safety_limit(f64::INFINITY), Duration::from_secs(600));
        assert_eq!(config.fps_for(ExportFormat::Gif), 15);
        assert_eq!(config.fps_for(ExportFormat::Mp4), 60);
    }
}
