use std::sync::Arc;

use crate::{error::RecorderError, recorder::codec::ExportFormat, video::Frame};

/// What an encoder session is opened with
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub format: ExportFormat,
    /// Negotiated codec; `None` lets the backend choose its default
    pub mime_type: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Bits per second
    pub bitrate: u64,
}

impl EncoderSettings {
    pub fn new(format: ExportFormat, width: u32, height: u32, fps: u32, bitrate: u64) -> Self {
        Self {
            format,
            mime_type: None,
            width,
            height,
            fps,
            bitrate,
        }
    }

    pub fn with_mime_type(&self, mime_type: Option<&str>) -> Self {
        Self {
            mime_type: mime_type.map(str::to_string),
            ..self.clone()
        }
    }

    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// A piece of encoded output as it leaves the encoder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedChunk(Vec<u8>);

impl EncodedChunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for EncodedChunk {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

/// Finished recording: every chunk in arrival order plus its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlob {
    data: Vec<u8>,
    mime_type: String,
}

impl EncodedBlob {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn from_chunks(chunks: Vec<EncodedChunk>, mime_type: impl Into<String>) -> Self {
        let total = chunks.iter().map(EncodedChunk::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(chunk.as_bytes());
        }
        Self::new(data, mime_type)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// A family of encoders, e.g. an FFmpeg install or an in-process GIF writer
pub trait EncoderBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this backend produces the given container at all
    fn handles(&self, format: ExportFormat) -> bool;

    /// Whether a specific `container;codecs=...` type can be encoded
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Open an encoder; `settings.mime_type == None` means use the default
    fn open(&self, settings: &EncoderSettings) -> Result<Box<dyn EncoderSession>, RecorderError>;
}

/// One running encoder
pub trait EncoderSession: Send {
    /// Full MIME type actually being produced
    fn mime_type(&self) -> &str;

    /// Feed one frame; returns whatever output became available
    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedChunk>, RecorderError>;

    /// Flush and close, returning the remaining output
    fn finish(self: Box<Self>) -> Result<Vec<EncodedChunk>, RecorderError>;
}

/// First backend in `backends` that produces `format`
pub fn select_backend(
    backends: &[Arc<dyn EncoderBackend>],
    format: ExportFormat,
) -> Result<Arc<dyn EncoderBackend>, RecorderError> {
    backends
        .iter()
        .find(|backend| backend.handles(format))
        .cloned()
        .ok_or_else(|| RecorderError::NoBackend {
            format: format.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_concatenates_chunks_in_order() {
        let chunks = vec![EncodedChunk::new(vec![1, 2]), EncodedChunk::new(vec![3])];
        let blob = EncodedBlob::from_chunks(chunks, "video/webm");
        assert_eq!(blob.as_bytes(), &[1, 2, 3]);
        assert_eq!(blob.mime_type(), "video/webm");
        assert_eq!(blob.len(), 3);
    }

    #[test]
    fn test_settings_frame_bytes() {
        let settings = EncoderSettings::new(ExportFormat::Webm, 4, 2, 60, 8_000_000);
        assert_eq!(settings.frame_bytes(), 32);
        assert_eq!(settings.with_mime_type(Some("video/webm")).mime_type.as_deref(), Some("video/webm"));
    }
}
