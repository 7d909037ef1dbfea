use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use image::codecs::gif::{GifEncoder, Repeat};
use image::Delay;
use tracing::debug;

use crate::{
    error::RecorderError,
    recorder::{
        backend::{EncodedChunk, EncoderBackend, EncoderSession, EncoderSettings},
        codec::{split_mime, ExportFormat},
    },
    video::Frame,
};

/// Animated GIF encoding in process with the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct GifBackend;

impl GifBackend {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderBackend for GifBackend {
    fn name(&self) -> &str {
        "gif"
    }

    fn handles(&self, format: ExportFormat) -> bool {
        format == ExportFormat::Gif
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        split_mime(mime_type).0 == "image/gif"
    }

    fn open(&self, settings: &EncoderSettings) -> Result<Box<dyn EncoderSession>, RecorderError> {
        if settings.format != ExportFormat::Gif {
            return Err(RecorderError::Construction {
                format: settings.format.to_string(),
                reason: "GIF backend only writes image/gif".to_string(),
            });
        }

        let buffer = SharedBuffer::default();
        let mut encoder = GifEncoder::new_with_speed(buffer.clone(), 10);
        encoder.set_repeat(Repeat::Infinite).map_err(|e| RecorderError::Construction {
            format: settings.format.to_string(),
            reason: e.to_string(),
        })?;

        debug!("Opened GIF encoder at {} fps", settings.fps);
        Ok(Box::new(GifSession {
            encoder: Some(encoder),
            buffer,
            delay: Delay::from_numer_denom_ms(1000, settings.fps.max(1)),
        }))
    }
}

/// `Write` target shared between the encoder and the session draining it
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        match self.0.lock() {
            Ok(mut bytes) => std::mem::take(&mut *bytes),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "GIF buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct GifSession {
    encoder: Option<GifEncoder<SharedBuffer>>,
    buffer: SharedBuffer,
    delay: Delay,
}

impl EncoderSession for GifSession {
    fn mime_type(&self) -> &str {
        "image/gif"
    }

    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedChunk>, RecorderError> {
        let encoder = self.encoder.as_mut().ok_or_else(|| RecorderError::Stream {
            reason: "GIF encoder already finished".to_string(),
        })?;

        let gif_frame = image::Frame::from_parts(frame.as_image().clone(), 0, 0, self.delay);
        encoder.encode_frame(gif_frame).map_err(|e| RecorderError::Stream {
            reason: e.to_string(),
        })?;

        Ok(vec![EncodedChunk::new(self.buffer.take())])
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<EncodedChunk>, RecorderError> {
        // Dropping the encoder writes the GIF trailer
        drop(self.encoder.take());
        Ok(vec![EncodedChunk::new(self.buffer.take())])
    }
}
