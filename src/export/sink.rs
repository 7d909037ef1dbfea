use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{error::SinkError, recorder::EncodedBlob};

/// Where finished exports end up
pub trait FileSink {
    /// Persist `blob` as `file_name`, returning the path written
    fn deliver(&mut self, blob: &EncodedBlob, file_name: &str) -> Result<PathBuf, SinkError>;
}

/// Writes exports to disk
///
/// A chosen destination file wins when set. Otherwise, or when writing there
/// fails, the file lands in the download directory under its suggested name.
#[derive(Debug, Clone)]
pub struct DiskSink {
    download_dir: PathBuf,
    destination: Option<PathBuf>,
}

impl DiskSink {
    pub fn new<P: AsRef<Path>>(download_dir: P) -> Self {
        Self {
            download_dir: download_dir.as_ref().to_path_buf(),
            destination: None,
        }
    }

    /// Save to exactly this path instead of the download directory
    pub fn with_destination<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.destination = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

impl FileSink for DiskSink {
    fn deliver(&mut self, blob: &EncodedBlob, file_name: &str) -> Result<PathBuf, SinkError> {
        if blob.is_empty() {
            return Err(SinkError::EmptyBlob {
                file_name: file_name.to_string(),
            });
        }

        if let Some(destination) = &self.destination {
            match write_atomically(destination, blob.as_bytes()) {
                Ok(()) => {
                    info!("💾 Saved {} bytes to {:?}", blob.len(), destination);
                    return Ok(destination.clone());
                }
                Err(e) => warn!("Could not save to chosen location, using downloads instead: {}", e),
            }
        }

        let path = self.download_dir.join(file_name);
        write_atomically(&path, blob.as_bytes())?;
        info!("💾 Saved {} bytes to {:?}", blob.len(), path);
        Ok(path)
    }
}

/// Write through a temporary file in the target directory, then rename
///
/// The temporary is deleted on every failure path when it drops.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
    let write_error = |source: std::io::Error| SinkError::Write {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_error)?;

    let mut temp = NamedTempFile::new_in(&dir).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

/// `screen-recording-2024-05-01T12-30-00.123Z.webm`
pub fn export_file_name(extension: &str, at: DateTime<Utc>) -> String {
    format!("screen-recording-{}.{}", at.format("%Y-%m-%dT%H-%M-%S%.3fZ"), extension)
}

/// `recording-2024-05-01T12-30-00-123Z.webm`
pub fn recording_file_name(extension: &str, at: DateTime<Utc>) -> String {
    let stamp = at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string().replace([':', '.'], "-");
    format!("recording-{}.{}", stamp, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn blob() -> EncodedBlob {
        EncodedBlob::new(vec![1, 2, 3], "video/webm")
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            export_file_name("webm", fixed_time()),
            "screen-recording-2024-05-01T12-30-00.000Z.webm"
        );
        assert_eq!(
            recording_file_name("webm", fixed_time()),
            "recording-2024-05-01T12-30-00-000Z.webm"
        );
    }

    #[test]
    fn test_writes_into_download_dir() {
        let dir = tempdir().unwrap();
        let mut sink = DiskSink::new(dir.path());

        let path = sink.deliver(&blob(), "clip.webm").unwrap();
        assert_eq!(path, dir.path().join("clip.webm"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_chosen_destination_wins() {
        let dir = tempdir().unwrap();
        let chosen = dir.path().join("picked").join("mine.webm");
        let mut sink = DiskSink::new(dir.path()).with_destination(&chosen);

        let path = sink.deliver(&blob(), "clip.webm").unwrap();
        assert_eq!(path, chosen);
        assert!(!dir.path().join("clip.webm").exists());
    }

    #[test]
    fn test_unwritable_destination_falls_back_to_downloads() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let mut sink = DiskSink::new(dir.path()).with_destination(blocker.join("out.webm"));

        let path = sink.deliver(&blob(), "clip.webm").unwrap();
        assert_eq!(path, dir.path().join("clip.webm"));
    }

    #[test]
    fn test_empty_blob_is_refused_and_leaves_nothing() {
        let dir = tempdir().unwrap();
        let mut sink = DiskSink::new(dir.path());

        let err = sink.deliver(&EncodedBlob::new(Vec::new(), "video/webm"), "clip.webm").unwrap_err();
        assert!(matches!(err, SinkError::EmptyBlob { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
