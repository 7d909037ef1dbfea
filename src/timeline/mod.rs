//! # Timeline
//!
//! Playhead display formatting and the split points used to cut a clip.

pub mod format;
pub mod splits;

pub use format::{format_elapsed, format_time_display};
pub use splits::{seek_back, seek_forward, Segment, SplitTimeline, SEEK_STEP, SPLIT_TOLERANCE};
