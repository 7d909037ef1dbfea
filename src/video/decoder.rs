use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use tracing::{debug, info};

use crate::error::VideoError;
use crate::video::clock::PlaybackClock;
use crate::video::source::VideoSource;
use crate::video::types::{Frame, VideoMetadata};

/// A recorded clip decoded on demand by an `ffmpeg` child process
///
/// Frames are streamed as raw RGBA in playback order. Seeking backwards
/// restarts the decoder at the new position. Once the decoder runs dry the
/// clip counts as ended, even when the container reported no duration.
///
/// Frame reads block on the decoder pipe. Playback is paced by the caller's
/// ticks, so a slow decoder delays the tick rather than dropping frames.
pub struct FfmpegVideo {
    path: PathBuf,
    ffmpeg: String,
    metadata: VideoMetadata,
    clock: PlaybackClock,
    muted: bool,
    controls_visible: bool,
    stream: Option<FrameStream>,
    current: Option<(u64, Frame)>,
    /// Index one past the last frame the decoder produced
    end_index: Option<u64>,
}

struct FrameStream {
    process: Child,
    stdout: BufReader<ChildStdout>,
    frame_size: usize,
    next_index: u64,
}

impl FfmpegVideo {
    /// Probe `path` and prepare it for playback
    pub fn open<P: AsRef<Path>>(path: P, ffmpeg: &str, ffprobe: &str) -> Result<Self, VideoError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(VideoError::LoadFailed {
                path: path.display().to_string(),
            });
        }

        let metadata = probe(&path, ffprobe)?;
        info!(
            "Opened {:?}: {}x{}, {:.2}s @ {:.2}fps",
            path, metadata.width, metadata.height, metadata.duration, metadata.fps
        );

        Ok(Self {
            path,
            ffmpeg: ffmpeg.to_string(),
            metadata,
            clock: PlaybackClock::new(metadata.duration),
            muted: false,
            controls_visible: true,
            stream: None,
            current: None,
            end_index: None,
        })
    }

    fn spawn_stream(&self, start_index: u64) -> Result<FrameStream, VideoError> {
        let start_secs = start_index as f64 / self.metadata.fps;
        let size = format!("{}x{}", self.metadata.width, self.metadata.height);
        let input = self.path.display().to_string();
        let start = format!("{:.6}", start_secs);

        debug!("Starting decoder for {:?} at {:.3}s", self.path, start_secs);

        let mut process = Command::new(&self.ffmpeg)
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-ss",
                start.as_str(),
                "-i",
                input.as_str(),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                size.as_str(),
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VideoError::DecodingFailed {
                reason: format!("Failed to start ffmpeg decoder: {}", e),
            })?;

        let stdout = process.stdout.take().ok_or_else(|| VideoError::DecodingFailed {
            reason: "Failed to capture ffmpeg stdout".to_string(),
        })?;

        let frame_size = (self.metadata.width * self.metadata.height * 4) as usize;
        Ok(FrameStream {
            process,
            stdout: BufReader::with_capacity(frame_size * 2, stdout),
            frame_size,
            next_index: start_index,
        })
    }

    fn playhead_index(&self) -> u64 {
        (self.clock.current_time() * self.metadata.fps).floor() as u64
    }

    fn target_index(&self) -> u64 {
        let last = (self.metadata.duration * self.metadata.fps).ceil().max(1.0) as u64 - 1;
        let target = self.playhead_index().min(last);
        match self.end_index {
            Some(end) => target.min(end.saturating_sub(1)),
            None => target,
        }
    }

    fn decoder_drained(&self) -> bool {
        self.end_index.is_some_and(|end| self.playhead_index() >= end)
    }
}

impl FrameStream {
    fn read_frame(&mut self, width: u32, height: u32) -> Result<Option<Frame>, VideoError> {
        let mut buffer = vec![0u8; self.frame_size];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {
                self.next_index += 1;
                Ok(Frame::from_rgba_bytes(width, height, buffer))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(VideoError::DecodingFailed {
                reason: format!("Failed to read frame: {}", e),
            }),
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

impl VideoSource for FfmpegVideo {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    fn seek(&mut self, seconds: f64) -> Result<(), VideoError> {
        if !seconds.is_finite() {
            return Err(VideoError::InvalidParameters {
                details: format!("seek target {}", seconds),
            });
        }
        self.clock.seek(seconds);
        self.end_index = None;
        Ok(())
    }

    fn play(&mut self) -> Result<(), VideoError> {
        self.clock.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.clock.pause();
    }

    fn is_paused(&self) -> bool {
        !self.clock.is_running() || self.has_ended()
    }

    fn has_ended(&self) -> bool {
        self.clock.has_ended() || self.decoder_drained()
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    fn current_frame(&mut self) -> Result<Option<&Frame>, VideoError> {
        let target = self.target_index();
        if matches!(&self.current, Some((index, _)) if *index == target) {
            return Ok(self.current.as_ref().map(|(_, frame)| frame));
        }

        if self.end_index.is_some_and(|end| target >= end) {
            return Ok(self.current.as_ref().map(|(_, frame)| frame));
        }

        let restart = match &self.stream {
            Some(stream) => target < stream.next_index,
            None => true,
        };
        if restart {
            self.stream = None;
            self.end_index = None;
            self.stream = Some(self.spawn_stream(target)?);
        }

        let (width, height) = (self.metadata.width, self.metadata.height);
        if let Some(stream) = self.stream.as_mut() {
            while stream.next_index <= target {
                let index = stream.next_index;
                match stream.read_frame(width, height)? {
                    Some(frame) => self.current = Some((index, frame)),
                    None => {
                        debug!("Decoder drained after {} frames", index);
                        self.end_index = Some(index);
                        break;
                    }
                }
            }
        }

        Ok(self.current.as_ref().map(|(_, frame)| frame))
    }
}

/// Read width, height, frame rate and duration with `ffprobe`
fn probe(path: &Path, ffprobe: &str) -> Result<VideoMetadata, VideoError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate:format=duration",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| VideoError::DecodingFailed {
            reason: format!("Failed to run ffprobe: {}", e),
        })?;

    if !output.status.success() {
        return Err(VideoError::LoadFailed {
            path: format!("{} ({})", path.display(), String::from_utf8_lossy(&output.stderr).trim()),
        });
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_output(text: &str) -> Result<VideoMetadata, VideoError> {
    let mut width = None;
    let mut height = None;
    let mut fps = None;
    let mut duration = None;

    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => width = value.parse::<u32>().ok(),
            "height" => height = value.parse::<u32>().ok(),
            "r_frame_rate" => fps = parse_frame_rate(value),
            "duration" => duration = value.parse::<f64>().ok(),
            _ => {}
        }
    }

    let (Some(width), Some(height)) = (width, height) else {
        return Err(VideoError::DecodingFailed {
            reason: format!("Unexpected ffprobe output: {}", text.trim()),
        });
    };

    Ok(VideoMetadata {
        width,
        height,
        fps: fps.filter(|f| *f > 0.0).unwrap_or(30.0),
        // Streamed WebM often carries no duration
        duration: duration.unwrap_or(f64::INFINITY),
    })
}

/// Parse "30/1", "30000/1001" or "25"
fn parse_frame_rate(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let text = "width=1280\nheight=720\nr_frame_rate=30000/1001\nduration=12.480000\n";
        let meta = parse_probe_output(text).unwrap();
        assert_eq!((meta.width, meta.height), (1280, 720));
        assert!((meta.fps - 29.97).abs() < 0.01);
        assert!((meta.duration - 12.48).abs() < 1e-9);
    }

    #[test]
    fn test_missing_duration_is_infinite() {
        let meta = parse_probe_output("width=640\nheight=480\nr_frame_rate=0/0\nduration=N/A\n").unwrap();
        assert!(meta.duration.is_infinite());
        assert_eq!(meta.fps, 30.0);
    }

    #[test]
    fn test_probe_output_without_dimensions_fails() {
        assert!(parse_probe_output("duration=3.0\n").is_err());
    }

    fn stub_video(decoder: &str, duration: f64) -> FfmpegVideo {
        let metadata = VideoMetadata {
            width: 2,
            height: 2,
            fps: 30.0,
            duration,
        };
        FfmpegVideo {
            path: PathBuf::from("clip.webm"),
            ffmpeg: decoder.to_string(),
            metadata,
            clock: PlaybackClock::new(duration),
            muted: false,
            controls_visible: true,
            stream: None,
            current: None,
            end_index: None,
        }
    }

    /// A decoder that prints `frames` black 2x2 RGBA frames and exits
    #[cfg(unix)]
    fn frame_printer(dir: &Path, frames: usize) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("decoder.sh");
        std::fs::write(&script, format!("#!/bin/sh\nhead -c {} /dev/zero\n", frames * 16)).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_empty_decoder_output_ends_clip_without_duration() {
        let mut video = stub_video("true", f64::INFINITY);
        video.play().unwrap();
        assert!(!video.has_ended());

        assert!(video.current_frame().unwrap().is_none());
        assert!(video.has_ended());
        assert!(video.is_paused());

        video.seek(0.0).unwrap();
        assert!(!video.has_ended());
        video.current_frame().unwrap();
        assert!(video.has_ended());
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_clip_ends_after_last_decoded_frame() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = frame_printer(dir.path(), 2);
        let mut video = stub_video(decoder.to_str().unwrap(), f64::INFINITY);
        video.play().unwrap();

        // 40ms is frame 1 at 30fps
        tokio::time::advance(std::time::Duration::from_millis(40)).await;
        assert!(video.current_frame().unwrap().is_some());
        assert!(!video.has_ended());
        assert!(!video.is_paused());

        tokio::time::advance(std::time::Duration::from_millis(60)).await;
        assert!(video.current_frame().unwrap().is_some());
        assert!(video.has_ended());
        assert!(video.is_paused());
    }

    #[test]
    fn test_open_missing_file() {
        let result = FfmpegVideo::open("/definitely/not/here.webm", "ffmpeg", "ffprobe");
        assert!(matches!(result, Err(VideoError::LoadFailed { .. })));
    }
}
