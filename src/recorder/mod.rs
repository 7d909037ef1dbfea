//! # Stream Recorder
//!
//! Codec negotiation and the encoder backends composited frames are fed
//! into. [`StreamRecorder`] buffers whatever the backend emits and hands it
//! back as a single [`EncodedBlob`] when stopped.

pub mod backend;
pub mod codec;
pub mod ffmpeg;
pub mod gif;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{select_backend, EncodedBlob, EncodedChunk, EncoderBackend, EncoderSession, EncoderSettings};
pub use codec::{negotiate, ExportFormat};
pub use ffmpeg::FfmpegBackend;
pub use gif::GifBackend;
pub use stream::{RecorderState, StreamRecorder};
