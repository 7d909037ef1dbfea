use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::recorder::backend::EncoderBackend;

/// Output formats the exporter can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Webm,
    Mp4,
    Gif,
    Png,
}

const WEBM_CANDIDATES: &[&str] = &["video/webm;codecs=vp9", "video/webm;codecs=vp8", "video/webm"];
const MP4_CANDIDATES: &[&str] = &["video/mp4;codecs=h264", "video/mp4;codecs=avc1", "video/mp4"];
const GIF_CANDIDATES: &[&str] = &["image/gif"];

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [ExportFormat::Webm, ExportFormat::Mp4, ExportFormat::Gif, ExportFormat::Png];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Webm => "webm",
            ExportFormat::Mp4 => "mp4",
            ExportFormat::Gif => "gif",
            ExportFormat::Png => "png",
        }
    }

    /// MIME type of the container, without codec parameters
    pub fn container_mime(self) -> &'static str {
        match self {
            ExportFormat::Webm => "video/webm",
            ExportFormat::Mp4 => "video/mp4",
            ExportFormat::Gif => "image/gif",
            ExportFormat::Png => "image/png",
        }
    }

    /// Ordered codec preference list tried during negotiation
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            ExportFormat::Webm => WEBM_CANDIDATES,
            ExportFormat::Mp4 => MP4_CANDIDATES,
            ExportFormat::Gif => GIF_CANDIDATES,
            ExportFormat::Png => &[],
        }
    }

    /// Single still frame rather than a stream
    pub fn is_snapshot(self) -> bool {
        matches!(self, ExportFormat::Png)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webm" => Ok(ExportFormat::Webm),
            "mp4" => Ok(ExportFormat::Mp4),
            "gif" => Ok(ExportFormat::Gif),
            "png" => Ok(ExportFormat::Png),
            other => Err(format!("unknown format '{}', expected webm, mp4, gif or png", other)),
        }
    }
}

/// Split `video/webm;codecs=vp9` into `("video/webm", Some("vp9"))`
pub fn split_mime(mime: &str) -> (&str, Option<&str>) {
    let mut parts = mime.split(';');
    let base = parts.next().unwrap_or_default().trim();
    let codec = parts
        .filter_map(|p| p.trim().strip_prefix("codecs="))
        .map(|c| c.trim_matches('"'))
        .next();
    (base, codec)
}

/// First preference the backend claims to support
///
/// `None` means no candidate is supported and the backend should fall back to
/// its own default for the container.
pub fn negotiate(format: ExportFormat, backend: &dyn EncoderBackend) -> Option<&'static str> {
    let chosen = format
        .candidates()
        .iter()
        .copied()
        .find(|mime| backend.is_type_supported(mime));
    debug!("Negotiated {:?} for {} on {}", chosen, format, backend.name());
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::testing::MemoryBackend;

    #[test]
    fn test_split_mime() {
        assert_eq!(split_mime("video/webm;codecs=vp9"), ("video/webm", Some("vp9")));
        assert_eq!(split_mime("video/mp4; codecs=\"avc1\""), ("video/mp4", Some("avc1")));
        assert_eq!(split_mime("image/gif"), ("image/gif", None));
    }

    #[test]
    fn test_first_supported_candidate_wins() {
        let backend = MemoryBackend::supporting(&["video/webm;codecs=vp8", "video/webm"]);
        assert_eq!(negotiate(ExportFormat::Webm, &backend), Some("video/webm;codecs=vp8"));

        let backend = MemoryBackend::supporting(&["video/mp4;codecs=avc1"]);
        assert_eq!(negotiate(ExportFormat::Mp4, &backend), Some("video/mp4;codecs=avc1"));
    }

    #[test]
    fn test_nothing_supported_defers_to_backend_default() {
        let backend = MemoryBackend::supporting(&[]);
        assert_eq!(negotiate(ExportFormat::Webm, &backend), None);
        assert_eq!(negotiate(ExportFormat::Png, &backend), None);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("MP4".parse::<ExportFormat>().unwrap(), ExportFormat::Mp4);
        assert_eq!(ExportFormat::Gif.container_mime(), "image/gif");
        assert!(ExportFormat::Png.is_snapshot());
        assert!("avi".parse::<ExportFormat>().is_err());
    }
}
