//! # Video Module
//!
//! Frames, playable video sources and the scoped presentation lock the
//! exporter holds while it drives playback.

pub mod clock;
pub mod types;

mod decoder;
mod source;
mod synthetic;

pub use clock::PlaybackClock;
pub use decoder::FfmpegVideo;
pub use source::{PresentationLock, VideoSource};
pub use synthetic::SyntheticVideo;
pub use types::{blend_over, Frame, PresentationState, VideoMetadata};
