use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::export::ExportArtifact;

/// Reported once the video is locked and rewound
pub const PROGRESS_PREPARED: u8 = 5;
/// Reported once the encoder is running and playback started
pub const PROGRESS_RECORDING: u8 = 10;
/// Ceiling while frames are still being captured
pub const PROGRESS_CAPTURE_CEILING: u8 = 95;
pub const PROGRESS_DONE: u8 = 100;

/// What a caller hears about a running export
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Progress(u8),
    Completed(ExportArtifact),
    Failed(String),
}

/// Percentage for a playhead position during capture
///
/// Capture spans 10..=95; anything past that is reserved for finalisation.
/// An unknown or zero duration stays at the capture floor.
pub fn playback_progress(current_time: f64, duration: f64) -> u8 {
    if !duration.is_finite() || duration <= 0.0 || !current_time.is_finite() {
        return PROGRESS_RECORDING;
    }
    let span = (PROGRESS_CAPTURE_CEILING - PROGRESS_RECORDING) as f64;
    let raw = PROGRESS_RECORDING as f64 + (current_time.max(0.0) / duration) * span;
    raw.min(PROGRESS_CAPTURE_CEILING as f64).floor() as u8
}

/// Forwards progress to the caller, never letting it move backwards
pub struct ProgressTracker {
    events: Option<UnboundedSender<ExportEvent>>,
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn new(events: Option<UnboundedSender<ExportEvent>>) -> Self {
        Self { events, last: None }
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }

    /// Report `value` unless it would regress or repeat the last value
    pub fn report(&mut self, value: u8) {
        let value = value.min(PROGRESS_DONE);
        if self.last.is_some_and(|last| value <= last) {
            return;
        }
        self.last = Some(value);
        debug!("Export progress {}%", value);
        self.send(ExportEvent::Progress(value));
    }

    pub fn completed(&mut self, artifact: ExportArtifact) {
        self.send(ExportEvent::Completed(artifact));
    }

    pub fn failed(&mut self, reason: String) {
        self.send(ExportEvent::Failed(reason));
    }

    fn send(&self, event: ExportEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is listening any more
            let _ = events.send(event);
        }
    }
}
