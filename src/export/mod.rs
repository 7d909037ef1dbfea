//! # Export
//!
//! The frame-capture loop that plays a clip through the compositor into an
//! encoder, reports progress and hands the finished file to a sink.

pub mod exporter;
pub mod progress;
pub mod sink;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{composition::QualityTier, recorder::ExportFormat};

pub use exporter::Exporter;
pub use progress::{playback_progress, ExportEvent, ProgressTracker};
pub use sink::{export_file_name, recording_file_name, DiskSink, FileSink};

/// What the caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub quality: QualityTier,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, quality: QualityTier) -> Self {
        Self { format, quality }
    }
}

/// A delivered export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub format: ExportFormat,
    pub quality: QualityTier,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub frames: u64,
    pub bytes: usize,
}
