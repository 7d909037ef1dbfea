//! # Recording Session
//!
//! Caller-owned capture of a raw clip from frames the caller supplies. A
//! session holds at most one encoder at a time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{
    error::{Result, StudioError},
    export::{recording_file_name, FileSink},
    recorder::{EncodedBlob, EncoderBackend, EncoderSettings, StreamRecorder},
    video::Frame,
};

/// Pointer position captured while recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    /// Milliseconds since the recording started
    pub at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Recording,
    Paused,
    Stopped,
    Disposed,
}

/// The finished raw capture
#[derive(Debug, Clone)]
pub struct RecordedClip {
    pub blob: EncodedBlob,
    /// Recorded time, pauses excluded
    pub duration: Duration,
    pub pointer: Vec<PointerSample>,
    /// Suggested `recording-<timestamp>.<ext>` name
    pub file_name: String,
}

impl RecordedClip {
    /// Hand the clip to a sink under its suggested name
    pub fn save(&self, sink: &mut dyn FileSink) -> Result<PathBuf> {
        Ok(sink.deliver(&self.blob, &self.file_name)?)
    }
}

pub struct RecordingSession {
    backend: Arc<dyn EncoderBackend>,
    settings: EncoderSettings,
    recorder: Option<StreamRecorder>,
    state: SessionState,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
    pointer: Vec<PointerSample>,
}

impl RecordingSession {
    pub fn create(backend: Arc<dyn EncoderBackend>, settings: EncoderSettings) -> Self {
        Self {
            backend,
            settings,
            recorder: None,
            state: SessionState::Created,
            started_at: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            pointer: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording | SessionState::Paused)
    }

    /// Open the encoder and start the clock
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Recording | SessionState::Paused => {
                return Err(StudioError::Recording("Recording already in progress".to_string()));
            }
            SessionState::Disposed => {
                return Err(StudioError::Recording("Session has been disposed".to_string()));
            }
            SessionState::Created | SessionState::Stopped => {}
        }

        let mut recorder = StreamRecorder::new(self.backend.clone());
        recorder.start(&self.settings)?;

        self.recorder = Some(recorder);
        self.pointer.clear();
        self.paused_total = Duration::ZERO;
        self.paused_at = None;
        self.started_at = Some(Instant::now());
        self.state = SessionState::Recording;
        info!("🔴 Recording started ({}x{} @ {} fps)", self.settings.width, self.settings.height, self.settings.fps);
        Ok(())
    }

    /// Encode one captured frame; returns `false` when it was dropped because
    /// the session is paused
    pub fn push_frame(&mut self, frame: &Frame) -> Result<bool> {
        if self.state == SessionState::Paused {
            return Ok(false);
        }
        let recorder = self.active_recorder()?;
        recorder.push_frame(frame)?;
        Ok(true)
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != SessionState::Recording {
            return Err(StudioError::Recording("Nothing to pause".to_string()));
        }
        self.paused_at = Some(Instant::now());
        self.state = SessionState::Paused;
        debug!("Recording paused at {:?}", self.elapsed());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != SessionState::Paused {
            return Err(StudioError::Recording("Recording is not paused".to_string()));
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += paused_at.elapsed();
        }
        self.state = SessionState::Recording;
        debug!("Recording resumed");
        Ok(())
    }

    /// Record a pointer position; ignored unless actively recording
    pub fn track_pointer(&mut self, x: f64, y: f64) {
        if self.state != SessionState::Recording {
            return;
        }
        let at_ms = self.elapsed().as_millis() as u64;
        self.pointer.push(PointerSample { x, y, at_ms });
    }

    pub fn pointer_samples(&self) -> &[PointerSample] {
        &self.pointer
    }

    /// Recorded time so far, pauses excluded
    pub fn elapsed(&self) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let paused_now = self.paused_at.map(|at| at.elapsed()).unwrap_or_default();
        started_at
            .elapsed()
            .saturating_sub(self.paused_total)
            .saturating_sub(paused_now)
    }

    /// Stop recording and collect the clip
    pub fn stop(&mut self) -> Result<RecordedClip> {
        let duration = self.elapsed();
        let mut recorder = self
            .recorder
            .take()
            .ok_or_else(|| StudioError::Recording("No recording in progress".to_string()))?;

        self.state = SessionState::Stopped;
        self.started_at = None;
        self.paused_at = None;
        let blob = recorder.stop()?;

        let file_name = recording_file_name(self.settings.format.extension(), Utc::now());
        info!("⏹️  Recording stopped: {:.1}s, {} bytes", duration.as_secs_f64(), blob.len());

        Ok(RecordedClip {
            blob,
            duration,
            pointer: std::mem::take(&mut self.pointer),
            file_name,
        })
    }

    /// Release the encoder and drop anything recorded
    pub fn dispose(&mut self) {
        if let Some(mut recorder) = self.recorder.take() {
            recorder.abort();
        }
        self.pointer.clear();
        self.started_at = None;
        self.paused_at = None;
        self.state = SessionState::Disposed;
    }

    fn active_recorder(&mut self) -> Result<&mut StreamRecorder> {
        self.recorder
            .as_mut()
            .ok_or_else(|| StudioError::Recording("No recording in progress".to_string()))
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.recorder.is_some() {
            self.dispose();
        }
    }
}
