use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// On-screen geometry of the styled container around the video
///
/// All values are in layout pixels, before any quality scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerLayout {
    pub width: f64,
    pub height: f64,
    /// Inset between the container edge and the video box
    pub padding: f64,
    pub corner_radius: f64,
}

impl ContainerLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding: 0.0,
            corner_radius: 0.0,
        }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius;
        self
    }

    /// Size the container around a video, like the editor does before export
    pub fn around_video(video_width: u32, video_height: u32, padding: f64) -> Self {
        Self::new(
            video_width as f64 + 2.0 * padding,
            video_height as f64 + 2.0 * padding,
        )
        .with_padding(padding)
    }

    /// A container `preview_width` wide whose video box keeps the video's
    /// aspect ratio
    pub fn fit_width(video_width: u32, video_height: u32, preview_width: f64, padding: f64) -> Self {
        let box_width = (preview_width - 2.0 * padding).max(0.0);
        let box_height = if video_width == 0 {
            0.0
        } else {
            box_width * video_height as f64 / video_width as f64
        };
        Self::new(box_width + 2.0 * padding, box_height + 2.0 * padding).with_padding(padding)
    }

    /// The video box: the container inset by `padding`, never negative
    pub fn video_box(&self) -> (f64, f64, f64, f64) {
        let inset = self.padding.max(0.0);
        let width = (self.width - 2.0 * inset).max(0.0);
        let height = (self.height - 2.0 * inset).max(0.0);
        (inset, inset, width, height)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        let finite = [self.width, self.height, self.padding, self.corner_radius]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width < 0.0 || self.height < 0.0 {
            return Err(RenderError::InvalidLayout {
                details: format!("{}x{} container", self.width, self.height),
            });
        }
        if self.padding < 0.0 || self.corner_radius < 0.0 {
            return Err(RenderError::InvalidLayout {
                details: "padding and corner radius must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Export quality preset
///
/// The tier alone decides the canvas scale factor and the target bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QualityTier {
    #[serde(rename = "720p")]
    Hd720,
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "2160p")]
    Uhd2160,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [QualityTier::Hd720, QualityTier::Hd1080, QualityTier::Uhd2160];

    pub fn scale_factor(self) -> f64 {
        match self {
            QualityTier::Hd720 => 2.0,
            QualityTier::Hd1080 => 2.5,
            QualityTier::Uhd2160 => 4.0,
        }
    }

    /// Target bitrate in bits per second
    pub fn bitrate(self) -> u64 {
        match self {
            QualityTier::Hd720 => 8_000_000,
            QualityTier::Hd1080 => 15_000_000,
            QualityTier::Uhd2160 => 30_000_000,
        }
    }

    /// Output canvas size for a container, each axis rounded down to even
    pub fn canvas_size(self, layout: &ContainerLayout) -> (u32, u32) {
        let scale = self.scale_factor();
        (even_floor(layout.width * scale), even_floor(layout.height * scale))
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Hd720 => "720p",
            QualityTier::Hd1080 => "1080p",
            QualityTier::Uhd2160 => "2160p",
        }
    }
}

fn even_floor(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let halves = (value / 2.0).floor();
    (halves * 2.0).min(u32::MAX as f64) as u32
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "720p" | "720" => Ok(QualityTier::Hd720),
            "1080p" | "1080" => Ok(QualityTier::Hd1080),
            "2160p" | "2160" | "4k" => Ok(QualityTier::Uhd2160),
            other => Err(format!("unknown quality '{}', expected 720p, 1080p or 2160p", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_size_is_even_per_tier() {
        let layout = ContainerLayout::new(800.0, 450.0);
        assert_eq!(QualityTier::Hd720.canvas_size(&layout), (1600, 900));
        assert_eq!(QualityTier::Hd1080.canvas_size(&layout), (2000, 1124));
        assert_eq!(QualityTier::Uhd2160.canvas_size(&layout), (3200, 1800));
    }

    #[test]
    fn test_odd_dimensions_round_down_to_even() {
        let layout = ContainerLayout::new(333.0, 101.0);
        let (w, h) = QualityTier::Hd1080.canvas_size(&layout);
        assert_eq!((w, h), (832, 252));
        assert_eq!(w % 2, 0);
        assert_eq!(h % 2, 0);
    }

    #[test]
    fn test_degenerate_container_gives_zero_canvas() {
        let layout = ContainerLayout::new(0.0, 450.0);
        assert_eq!(QualityTier::Hd720.canvas_size(&layout).0, 0);

        let tiny = ContainerLayout::new(0.3, 0.3);
        assert_eq!(QualityTier::Hd720.canvas_size(&tiny), (0, 0));
    }

    #[test]
    fn test_tier_table() {
        assert_eq!(QualityTier::Hd720.bitrate(), 8_000_000);
        assert_eq!(QualityTier::Hd1080.bitrate(), 15_000_000);
        assert_eq!(QualityTier::Uhd2160.bitrate(), 30_000_000);
        assert_eq!("4k".parse::<QualityTier>().unwrap(), QualityTier::Uhd2160);
        assert!("480p".parse::<QualityTier>().is_err());
    }

    #[test]
    fn test_video_box_respects_padding() {
        let layout = ContainerLayout::around_video(640, 360, 40.0);
        assert_eq!(layout.width, 720.0);
        assert_eq!(layout.video_box(), (40.0, 40.0, 640.0, 360.0));

        let crushed = ContainerLayout::new(50.0, 50.0).with_padding(40.0);
        assert_eq!(crushed.video_box(), (40.0, 40.0, 0.0, 0.0));
    }

    #[test]
    fn test_fit_width_keeps_aspect_ratio() {
        let layout = ContainerLayout::fit_width(1920, 1080, 720.0, 40.0);
        assert_eq!(layout.width, 720.0);
        assert_eq!(layout.height, 640.0 * 9.0 / 16.0 + 80.0);
        assert_eq!(layout.video_box(), (40.0, 40.0, 640.0, 360.0));

        let empty = ContainerLayout::fit_width(0, 0, 720.0, 40.0);
        assert_eq!(empty.video_box().3, 0.0);
    }

    #[test]
    fn test_validate_rejects_negative_padding() {
        assert!(ContainerLayout::new(10.0, 10.0).with_padding(-1.0).validate().is_err());
        assert!(ContainerLayout::new(f64::NAN, 10.0).validate().is_err());
        assert!(ContainerLayout::new(10.0, 10.0).validate().is_ok());
    }
}
