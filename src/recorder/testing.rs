//! In-memory encoder backend for tests

use std::sync::{Arc, Mutex};

use crate::{
    error::RecorderError,
    recorder::{
        backend::{EncodedChunk, EncoderBackend, EncoderSession, EncoderSettings},
        codec::ExportFormat,
    },
    video::Frame,
};

/// Emits one byte per frame (the frame index) and a `0xFF` trailer
#[derive(Default)]
pub struct MemoryBackend {
    supported: Vec<String>,
    failing: Vec<Option<String>>,
    silent: bool,
    fail_after: Option<u64>,
    opened: Arc<Mutex<Vec<Option<String>>>>,
    frame_sizes: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl MemoryBackend {
    pub fn supporting(types: &[&str]) -> Self {
        Self {
            supported: types.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, mime: &str) -> Self {
        self.failing.push(Some(mime.to_string()));
        self
    }

    pub fn failing_default(mut self) -> Self {
        self.failing.push(None);
        self
    }

    pub fn producing_nothing(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn failing_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// MIME types `open` was called with, in order
    pub fn opened(&self) -> Vec<Option<String>> {
        self.opened.lock().unwrap().clone()
    }

    /// Dimensions of every frame encoded so far
    pub fn frame_sizes(&self) -> Vec<(u32, u32)> {
        self.frame_sizes.lock().unwrap().clone()
    }
}

impl EncoderBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn handles(&self, format: ExportFormat) -> bool {
        !format.is_snapshot()
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|t| t == mime_type)
    }

    fn open(&self, settings: &EncoderSettings) -> Result<Box<dyn EncoderSession>, RecorderError> {
        self.opened.lock().unwrap().push(settings.mime_type.clone());
        if self.failing.contains(&settings.mime_type) {
            return Err(RecorderError::Stream {
                reason: format!("cannot construct {:?}", settings.mime_type),
            });
        }

        let mime_type = settings
            .mime_type
            .clone()
            .unwrap_or_else(|| settings.format.container_mime().to_string());
        Ok(Box::new(MemorySession {
            mime_type,
            silent: self.silent,
            fail_after: self.fail_after,
            frames: 0,
            frame_sizes: self.frame_sizes.clone(),
        }))
    }
}

struct MemorySession {
    mime_type: String,
    silent: bool,
    fail_after: Option<u64>,
    frames: u64,
    frame_sizes: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl EncoderSession for MemorySession {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedChunk>, RecorderError> {
        if self.fail_after.is_some_and(|limit| self.frames >= limit) {
            return Err(RecorderError::Stream {
                reason: "encoder crashed".to_string(),
            });
        }
        self.frame_sizes.lock().unwrap().push(frame.dimensions());
        let index = self.frames as u8;
        self.frames += 1;

        if self.silent {
            Ok(vec![EncodedChunk::default()])
        } else {
            Ok(vec![EncodedChunk::new(vec![index]), EncodedChunk::default()])
        }
    }

    fn finish(self: Box<Self>) -> Result<Vec<EncodedChunk>, RecorderError> {
        if self.silent {
            Ok(Vec::new())
        } else {
            Ok(vec![EncodedChunk::new(vec![0xFF])])
        }
    }
}
