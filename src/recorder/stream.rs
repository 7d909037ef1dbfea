use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    error::RecorderError,
    recorder::{
        backend::{EncodedBlob, EncodedChunk, EncoderBackend, EncoderSession, EncoderSettings},
        codec::{negotiate, split_mime},
    },
    video::Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopping,
    Stopped,
    Error,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecorderState::Idle => "idle",
            RecorderState::Recording => "recording",
            RecorderState::Stopping => "stopping",
            RecorderState::Stopped => "stopped",
            RecorderState::Error => "in error",
        };
        f.write_str(name)
    }
}

/// Buffers encoded output of a frame stream until it is stopped
///
/// `Idle -> Recording -> Stopping -> Stopped`, or `Recording -> Error` when
/// the encoder fails mid-stream. Each recorder is single use.
pub struct StreamRecorder {
    backend: Arc<dyn EncoderBackend>,
    state: RecorderState,
    session: Option<Box<dyn EncoderSession>>,
    chunks: Vec<EncodedChunk>,
    mime_type: Option<String>,
    frames_encoded: u64,
}

impl StreamRecorder {
    pub fn new(backend: Arc<dyn EncoderBackend>) -> Self {
        Self {
            backend,
            state: RecorderState::Idle,
            session: None,
            chunks: Vec::new(),
            mime_type: None,
            frames_encoded: 0,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Full negotiated MIME type, once started
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    pub fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(EncodedChunk::len).sum()
    }

    /// Negotiate a codec and open the encoder
    pub fn start(&mut self, settings: &EncoderSettings) -> Result<(), RecorderError> {
        self.expect_state(RecorderState::Idle, "start")?;

        let preferred = negotiate(settings.format, self.backend.as_ref());
        let session = match self.backend.open(&settings.with_mime_type(preferred)) {
            Ok(session) => session,
            Err(e) if preferred.is_some() => {
                warn!("Encoder for {:?} failed ({}), retrying with default", preferred, e);
                self.open_default(settings)?
            }
            Err(e) => {
                self.state = RecorderState::Error;
                return Err(construction_error(settings, e));
            }
        };

        info!(
            "🎥 Recording {}x{} @ {} fps as {} via {}",
            settings.width,
            settings.height,
            settings.fps,
            session.mime_type(),
            self.backend.name()
        );
        self.mime_type = Some(session.mime_type().to_string());
        self.session = Some(session);
        self.state = RecorderState::Recording;
        Ok(())
    }

    fn open_default(&mut self, settings: &EncoderSettings) -> Result<Box<dyn EncoderSession>, RecorderError> {
        self.backend.open(&settings.with_mime_type(None)).map_err(|e| {
            self.state = RecorderState::Error;
            construction_error(settings, e)
        })
    }

    /// Encode one frame
    pub fn push_frame(&mut self, frame: &Frame) -> Result<(), RecorderError> {
        self.expect_state(RecorderState::Recording, "accept frames")?;
        let Some(session) = self.session.as_mut() else {
            return Err(self.fail("encoder session missing"));
        };

        match session.encode(frame) {
            Ok(chunks) => {
                self.frames_encoded += 1;
                self.buffer(chunks);
                Ok(())
            }
            Err(e) => Err(self.fail(&e.to_string())),
        }
    }

    /// Flush the encoder and hand back everything recorded
    ///
    /// Completes exactly once; later calls fail with `InvalidState`.
    pub fn stop(&mut self) -> Result<EncodedBlob, RecorderError> {
        self.expect_state(RecorderState::Recording, "stop")?;
        self.state = RecorderState::Stopping;

        let Some(session) = self.session.take() else {
            return Err(self.fail("encoder session missing"));
        };
        match session.finish() {
            Ok(chunks) => self.buffer(chunks),
            Err(e) => return Err(self.fail(&e.to_string())),
        }

        let mime = self.mime_type.as_deref().map(|m| split_mime(m).0).unwrap_or_default().to_string();
        let blob = EncodedBlob::from_chunks(std::mem::take(&mut self.chunks), mime);
        self.state = RecorderState::Stopped;

        debug!("Recorder stopped: {} frames, {} bytes", self.frames_encoded, blob.len());
        Ok(blob)
    }

    /// Drop the encoder and anything buffered without producing output
    pub fn abort(&mut self) {
        if self.session.take().is_some() {
            debug!("Recorder aborted after {} frames", self.frames_encoded);
        }
        self.chunks.clear();
        if self.state != RecorderState::Error {
            self.state = RecorderState::Stopped;
        }
    }

    fn buffer(&mut self, chunks: Vec<EncodedChunk>) {
        self.chunks.extend(chunks.into_iter().filter(|c| !c.is_empty()));
    }

    fn fail(&mut self, reason: &str) -> RecorderError {
        self.state = RecorderState::Error;
        self.session = None;
        self.chunks.clear();
        RecorderError::Stream {
            reason: reason.to_string(),
        }
    }

    fn expect_state(&self, expected: RecorderState, action: &str) -> Result<(), RecorderError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RecorderError::InvalidState {
                state: self.state.to_string(),
                action: action.to_string(),
            })
        }
    }
}

fn construction_error(settings: &EncoderSettings, cause: RecorderError) -> RecorderError {
    RecorderError::Construction {
        format: settings.format.to_string(),
        reason: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{codec::ExportFormat, testing::MemoryBackend};

    fn settings() -> EncoderSettings {
        EncoderSettings::new(ExportFormat::Webm, 4, 4, 60, 8_000_000)
    }

    fn frame() -> Frame {
        Frame::new_filled(4, 4, [1, 2, 3, 255])
    }

    #[test]
    fn test_record_and_stop_produces_blob() {
        let backend = Arc::new(MemoryBackend::supporting(&["video/webm;codecs=vp9"]));
        let mut recorder = StreamRecorder::new(backend.clone());

        recorder.start(&settings()).unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);
        assert_eq!(recorder.mime_type(), Some("video/webm;codecs=vp9"));

        recorder.push_frame(&frame()).unwrap();
        recorder.push_frame(&frame()).unwrap();
        let blob = recorder.stop().unwrap();

        assert_eq!(recorder.state(), RecorderState::Stopped);
        assert_eq!(blob.mime_type(), "video/webm");
        assert_eq!(blob.as_bytes(), &[0, 1, 0xFF]);
    }

    #[test]
    fn test_second_stop_is_rejected() {
        let mut recorder = StreamRecorder::new(Arc::new(MemoryBackend::supporting(&["video/webm"])));
        recorder.start(&settings()).unwrap();
        recorder.stop().unwrap();

        let err = recorder.stop().unwrap_err();
        assert!(matches!(err, RecorderError::InvalidState { .. }));
    }

    #[test]
    fn test_failed_candidate_retries_with_default() {
        let backend = Arc::new(
            MemoryBackend::supporting(&["video/webm;codecs=vp9"]).failing_on("video/webm;codecs=vp9"),
        );
        let mut recorder = StreamRecorder::new(backend.clone());

        recorder.start(&settings()).unwrap();
        assert_eq!(backend.opened(), vec![Some("video/webm;codecs=vp9".to_string()), None]);
        assert_eq!(recorder.mime_type(), Some("video/webm"));
    }

    #[test]
    fn test_default_failure_is_fatal() {
        let backend = Arc::new(MemoryBackend::supporting(&[]).failing_default());
        let mut recorder = StreamRecorder::new(backend);

        let err = recorder.start(&settings()).unwrap_err();
        assert!(matches!(err, RecorderError::Construction { .. }));
        assert_eq!(recorder.state(), RecorderState::Error);
    }

    #[test]
    fn test_empty_chunks_are_ignored() {
        let backend = Arc::new(MemoryBackend::supporting(&["video/webm"]).producing_nothing());
        let mut recorder = StreamRecorder::new(backend);
        recorder.start(&settings()).unwrap();
        recorder.push_frame(&frame()).unwrap();

        assert_eq!(recorder.buffered_bytes(), 0);
        assert!(recorder.stop().unwrap().is_empty());
    }

    #[test]
    fn test_mid_stream_failure_moves_to_error() {
        let backend = Arc::new(MemoryBackend::supporting(&["video/webm"]).failing_after(1));
        let mut recorder = StreamRecorder::new(backend);
        recorder.start(&settings()).unwrap();

        recorder.push_frame(&frame()).unwrap();
        assert!(matches!(recorder.push_frame(&frame()), Err(RecorderError::Stream { .. })));
        assert_eq!(recorder.state(), RecorderState::Error);
        assert!(recorder.stop().is_err());
    }
}
