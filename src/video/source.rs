use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::VideoError;
use crate::video::types::{Frame, PresentationState, VideoMetadata};

/// A playable clip the export pipeline can drive
///
/// Mirrors the parts of a media element the exporter touches: playback
/// control, presentation toggles and the currently decoded frame.
pub trait VideoSource {
    fn metadata(&self) -> VideoMetadata;

    /// Natural (intrinsic) frame size; `(0, 0)` when unknown
    fn natural_size(&self) -> (u32, u32) {
        let meta = self.metadata();
        (meta.width, meta.height)
    }

    fn duration(&self) -> f64 {
        self.metadata().duration
    }

    fn current_time(&self) -> f64;

    fn seek(&mut self, seconds: f64) -> Result<(), VideoError>;

    fn play(&mut self) -> Result<(), VideoError>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn has_ended(&self) -> bool;

    fn is_muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    fn controls_visible(&self) -> bool;

    fn set_controls_visible(&mut self, visible: bool);

    /// The frame matching the current playback position, if one is decoded
    fn current_frame(&mut self) -> Result<Option<&Frame>, VideoError>;

    fn presentation_state(&self) -> PresentationState {
        PresentationState {
            paused: self.is_paused(),
            muted: self.is_muted(),
            controls_visible: self.controls_visible(),
            current_time: self.current_time(),
        }
    }
}

/// Exclusive, scoped hold on a caller's video
///
/// Records the presentation state on acquisition and puts it back when
/// dropped, whichever way the holder exits.
pub struct PresentationLock<'a> {
    video: &'a mut dyn VideoSource,
    saved: PresentationState,
}

impl<'a> PresentationLock<'a> {
    pub fn acquire(video: &'a mut dyn VideoSource) -> Self {
        let saved = video.presentation_state();
        debug!(?saved, "Acquired presentation lock");
        Self { video, saved }
    }

    /// Restore now instead of at end of scope
    pub fn release(self) {}

    fn restore(&mut self) {
        let saved = self.saved;
        self.video.pause();
        self.video.set_muted(saved.muted);
        self.video.set_controls_visible(saved.controls_visible);

        if let Err(e) = self.video.seek(saved.current_time) {
            warn!("Could not restore playback position {:.2}s: {}", saved.current_time, e);
        }
        if !saved.paused {
            if let Err(e) = self.video.play() {
                warn!("Could not resume playback after export: {}", e);
            }
        }
        debug!(?saved, "Restored presentation state");
    }
}

impl<'a> Deref for PresentationLock<'a> {
    type Target = dyn VideoSource + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.video
    }
}

impl<'a> DerefMut for PresentationLock<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.video
    }
}

impl Drop for PresentationLock<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}
