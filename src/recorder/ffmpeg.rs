use std::collections::HashSet;
use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::OnceLock;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::{
    error::RecorderError,
    recorder::{
        backend::{EncodedChunk, EncoderBackend, EncoderSession, EncoderSettings},
        codec::{split_mime, ExportFormat},
    },
    video::Frame,
};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Encodes WebM and MP4 by piping raw frames through an `ffmpeg` process
pub struct FfmpegBackend {
    ffmpeg_path: String,
    encoders: OnceLock<HashSet<String>>,
}

impl FfmpegBackend {
    pub fn new<S: Into<String>>(ffmpeg_path: S) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            encoders: OnceLock::new(),
        }
    }

    /// Check if FFmpeg is available on the system
    pub fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn encoders(&self) -> &HashSet<String> {
        self.encoders.get_or_init(|| {
            let output = Command::new(&self.ffmpeg_path)
                .args(["-hide_banner", "-encoders"])
                .stdin(Stdio::null())
                .stderr(Stdio::null())
                .output();

            match output {
                Ok(output) if output.status.success() => {
                    let encoders = parse_encoder_list(&String::from_utf8_lossy(&output.stdout));
                    debug!("FFmpeg reports {} video encoders", encoders.len());
                    encoders
                }
                Ok(output) => {
                    warn!("ffmpeg -encoders exited with {}", output.status);
                    HashSet::new()
                }
                Err(e) => {
                    warn!("FFmpeg not available at '{}': {}", self.ffmpeg_path, e);
                    HashSet::new()
                }
            }
        })
    }

    /// Library encoder for a container/codec pair, if installed
    fn encoder_for(&self, format: ExportFormat, codec: Option<&str>) -> Option<(&'static str, &'static str)> {
        let options: &[(&'static str, &'static str)] = match (format, codec) {
            (ExportFormat::Webm, Some("vp9")) => &[("vp9", "libvpx-vp9")],
            (ExportFormat::Webm, Some("vp8")) => &[("vp8", "libvpx")],
            (ExportFormat::Webm, None) => &[("vp9", "libvpx-vp9"), ("vp8", "libvpx")],
            (ExportFormat::Mp4, Some("h264")) => &[("h264", "libx264"), ("h264", "libopenh264")],
            (ExportFormat::Mp4, Some("avc1")) => &[("avc1", "libx264"), ("avc1", "libopenh264")],
            (ExportFormat::Mp4, None) => &[("h264", "libx264"), ("h264", "libopenh264")],
            _ => &[],
        };
        let installed = self.encoders();
        options.iter().copied().find(|(_, encoder)| installed.contains(*encoder))
    }
}

impl EncoderBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn handles(&self, format: ExportFormat) -> bool {
        matches!(format, ExportFormat::Webm | ExportFormat::Mp4)
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        let (container, codec) = split_mime(mime_type);
        let format = match container {
            "video/webm" => ExportFormat::Webm,
            "video/mp4" => ExportFormat::Mp4,
            _ => return false,
        };
        self.encoder_for(format, codec).is_some()
    }

    fn open(&self, settings: &EncoderSettings) -> Result<Box<dyn EncoderSession>, RecorderError> {
        let codec = settings.mime_type.as_deref().and_then(|m| split_mime(m).1);
        let (codec_name, encoder) =
            self.encoder_for(settings.format, codec)
                .ok_or_else(|| RecorderError::Construction {
                    format: settings.format.to_string(),
                    reason: format!("no FFmpeg encoder for codec {:?}", codec),
                })?;

        let mime_type = format!("{};codecs={}", settings.format.container_mime(), codec_name);
        let args = encoder_args(settings, encoder);
        info!("Starting FFmpeg encoder: {} {}", self.ffmpeg_path, args.join(" "));

        FfmpegSession::spawn(&self.ffmpeg_path, &args, settings, mime_type)
            .map(|session| Box::new(session) as Box<dyn EncoderSession>)
    }
}

fn encoder_args(settings: &EncoderSettings, encoder: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgba".into(),
        "-s".into(),
        format!("{}x{}", settings.width, settings.height),
        "-r".into(),
        settings.fps.to_string(),
        "-i".into(),
        "-".into(),
        "-c:v".into(),
        encoder.into(),
        "-b:v".into(),
        settings.bitrate.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ];

    match settings.format {
        ExportFormat::Mp4 => {
            args.extend(["-preset".to_string(), "veryfast".to_string()]);
            // stdout is not seekable, so the moov atom has to come first
            args.extend(["-movflags".to_string(), "frag_keyframe+empty_moov".to_string()]);
            args.extend(["-f".to_string(), "mp4".to_string()]);
        }
        _ => {
            args.extend(["-deadline".to_string(), "realtime".to_string()]);
            args.extend(["-f".to_string(), "webm".to_string()]);
        }
    }

    args.push("pipe:1".into());
    args
}

/// Names of the video encoders in `ffmpeg -encoders` output
fn parse_encoder_list(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let flags = fields.next()?;
            let name = fields.next()?;
            (flags.len() == 6 && flags.starts_with('V') && name != "=").then(|| name.to_string())
        })
        .collect()
}

/// A running `ffmpeg` encoder
///
/// Frames go into stdin with a blocking write, so a stalled encoder holds up
/// the caller's capture tick until the pipe drains. Output is read on its own
/// thread, which keeps the two pipes from deadlocking each other.
struct FfmpegSession {
    process: Child,
    stdin: Option<ChildStdin>,
    output: Receiver<Vec<u8>>,
    reader: Option<JoinHandle<std::io::Result<()>>>,
    mime_type: String,
    frame_bytes: usize,
    frame_count: u64,
}

impl FfmpegSession {
    fn spawn(
        ffmpeg_path: &str,
        args: &[String],
        settings: &EncoderSettings,
        mime_type: String,
    ) -> Result<Self, RecorderError> {
        let construction = |reason: String| RecorderError::Construction {
            format: settings.format.to_string(),
            reason,
        };

        let mut process = Command::new(ffmpeg_path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| construction(format!("Failed to start FFmpeg encoder: {}", e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| construction("Failed to capture FFmpeg stdin".to_string()))?;
        let mut stdout = process
            .stdout
            .take()
            .ok_or_else(|| construction("Failed to capture FFmpeg stdout".to_string()))?;

        let (tx, rx) = mpsc::channel();
        let reader = std::thread::spawn(move || {
            let mut buffer = vec![0u8; READ_CHUNK_SIZE];
            loop {
                let read = stdout.read(&mut buffer)?;
                if read == 0 || tx.send(buffer[..read].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });

        Ok(Self {
            process,
            stdin: Some(stdin),
            output: rx,
            reader: Some(reader),
            mime_type,
            frame_bytes: settings.frame_bytes(),
            frame_count: 0,
        })
    }

    fn drain(&self) -> Vec<EncodedChunk> {
        self.output.try_iter().map(EncodedChunk::new).collect()
    }
}

impl EncoderSession for FfmpegSession {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedChunk>, RecorderError> {
        let data = frame.as_rgba_bytes();
        if data.len() != self.frame_bytes {
            return Err(RecorderError::Stream {
                reason: format!("frame has {} bytes, encoder expects {}", data.len(), self.frame_bytes),
            });
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| RecorderError::Stream {
            reason: "encoder input already closed".to_string(),
        })?;
        stdin.write_all(data).map_err(|e| RecorderError::Stream {
            reason: format!("Failed to write frame: {}", e),
        })?;
        self.frame_count += 1;

        Ok(self.drain())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<EncodedChunk>, RecorderError> {
        // Close stdin to signal EOF to FFmpeg
        drop(self.stdin.take());

        let status = self.process.wait().map_err(|e| RecorderError::Stream {
            reason: format!("Failed to wait for FFmpeg: {}", e),
        })?;

        if let Some(reader) = self.reader.take() {
            match reader.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Reading FFmpeg output failed: {}", e),
                Err(_) => warn!("FFmpeg output reader panicked"),
            }
        }

        if !status.success() {
            return Err(RecorderError::Stream {
                reason: format!("FFmpeg exited with {}", status),
            });
        }

        info!("FFmpeg encoder finished: {} frames written", self.frame_count);
        Ok(self.drain())
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            drop(self.stdin.take());
            let _ = self.process.kill();
            let _ = self.process.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODERS: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D aac                  AAC (Advanced Audio Coding)
";

    #[test]
    fn test_parse_encoder_list_keeps_video_encoders() {
        let encoders = parse_encoder_list(ENCODERS);
        assert!(encoders.contains("libx264"));
        assert!(encoders.contains("libvpx-vp9"));
        assert!(!encoders.contains("aac"));
        assert!(!encoders.contains("="));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let backend = FfmpegBackend::new("/definitely/not/ffmpeg");
        assert!(!backend.is_available());
        assert!(!backend.is_type_supported("video/webm;codecs=vp9"));
    }

    fn backend_with(encoders: &str) -> FfmpegBackend {
        let backend = FfmpegBackend::new("ffmpeg");
        let _ = backend.encoders.set(parse_encoder_list(encoders));
        backend
    }

    #[test]
    fn test_type_support_follows_installed_encoders() {
        let backend = backend_with(ENCODERS);
        assert!(backend.is_type_supported("video/webm;codecs=vp9"));
        assert!(!backend.is_type_supported("video/webm;codecs=vp8"));
        assert!(backend.is_type_supported("video/webm"));
        assert!(backend.is_type_supported("video/mp4;codecs=avc1"));
        assert!(!backend.is_type_supported("image/gif"));
    }

    #[test]
    fn test_missing_encoder_fails_construction() {
        let backend = backend_with("");
        let settings = EncoderSettings::new(ExportFormat::Webm, 16, 16, 30, 1_000_000);
        assert!(matches!(
            backend.open(&settings),
            Err(RecorderError::Construction { .. })
        ));
    }

    #[test]
    fn test_mp4_args_stream_fragmented_output() {
        let settings = EncoderSettings::new(ExportFormat::Mp4, 1920, 1080, 60, 15_000_000);
        let args = encoder_args(&settings, "libx264");
        let joined = args.join(" ");
        assert!(joined.contains("-s 1920x1080"));
        assert!(joined.contains("-b:v 15000000"));
        assert!(joined.contains("frag_keyframe+empty_moov"));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }
}
