//! # Screen-Studio
//!
//! Composite screen recordings onto styled backdrops and export them as WebM,
//! MP4, GIF or PNG files.
//!
//! The exporter plays a clip in real time, paints every frame into a styled
//! container (backdrop, padding, rounded video corners) at the chosen output
//! quality and streams the frames into an encoder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use screen_studio::{
//!     backgrounds::BackdropRegistry,
//!     composition::{ContainerLayout, FrameCompositor, QualityTier},
//!     config::Config,
//!     export::{DiskSink, ExportRequest, Exporter},
//!     recorder::ExportFormat,
//!     video::FfmpegVideo,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let mut video = FfmpegVideo::open("clip.webm", "ffmpeg", "ffprobe")?;
//!
//! let registry = BackdropRegistry::new();
//! let backdrop = registry.get_backdrop("preset-3").unwrap();
//! let layout = ContainerLayout::around_video(1280, 720, 40.0);
//! let compositor = FrameCompositor::new(layout, backdrop);
//!
//! let mut exporter = Exporter::new(config.export.clone(), DiskSink::new("."))
//!     .with_default_backends(&config.recorder.ffmpeg_path);
//!
//! let request = ExportRequest::new(ExportFormat::Mp4, QualityTier::Hd1080);
//! let artifact = exporter.export(Some(&mut video), Some(&compositor), &request).await?;
//! println!("Saved {:?}", artifact.path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Frames and playable video sources
//! - [`backgrounds`] - Backdrop presets painted behind the video
//! - [`composition`] - Styled container layout and the frame compositor
//! - [`recorder`] - Codec negotiation and encoder backends
//! - [`export`] - The real-time export loop, progress and file delivery
//! - [`session`] - Raw clip recording from caller-supplied frames
//! - [`timeline`] - Editor time display and split points
//! - [`config`] - Configuration management
//!
//! ## Custom Backdrops
//!
//! Implement [`Backdrop`](backgrounds::Backdrop) and register it by name:
//!
//! ```rust,no_run
//! use screen_studio::backgrounds::{Backdrop, BackdropRegistry};
//! use screen_studio::error::BackgroundError;
//! use screen_studio::video::Frame;
//!
//! struct Stripes;
//!
//! impl Backdrop for Stripes {
//!     fn name(&self) -> &str {
//!         "stripes"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Alternating rows"
//!     }
//!
//!     fn paint(&self, frame: &mut Frame) -> Result<(), BackgroundError> {
//!         for y in (0..frame.height()).step_by(2) {
//!             for x in 0..frame.width() {
//!                 frame.set_pixel(x, y, [0, 0, 0, 255]);
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = BackdropRegistry::new();
//! registry.register("stripes".to_string(), || Box::new(Stripes));
//! ```

pub mod backgrounds;
pub mod composition;
pub mod config;
pub mod error;
pub mod export;
pub mod recorder;
pub mod session;
pub mod timeline;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    backgrounds::{Backdrop, BackdropRegistry},
    composition::{ContainerLayout, FrameCompositor, FrameSource, QualityTier},
    config::Config,
    error::{Result, StudioError},
    export::{ExportArtifact, ExportEvent, ExportRequest, Exporter},
    recorder::ExportFormat,
    session::{RecordedClip, RecordingSession},
};
