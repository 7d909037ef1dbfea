use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    composition::FrameSource,
    config::ExportConfig,
    error::{ExportError, RenderError},
    export::{
        progress::{playback_progress, ExportEvent, ProgressTracker, PROGRESS_DONE, PROGRESS_PREPARED, PROGRESS_RECORDING},
        sink::{export_file_name, FileSink},
        ExportArtifact, ExportRequest,
    },
    recorder::{select_backend, EncodedBlob, EncoderBackend, EncoderSettings, FfmpegBackend, GifBackend, StreamRecorder},
    video::{Frame, PresentationLock, VideoSource},
};

/// How capture ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureEnd {
    /// The video ended or was paused
    Playback,
    /// The safety timer ran out first
    TimedOut,
}

/// Drives a video through the compositor into an encoder and delivers the file
///
/// One job runs at a time; `export` borrows both the exporter and the video
/// mutably for its whole duration.
pub struct Exporter<S: FileSink> {
    config: ExportConfig,
    backends: Vec<Arc<dyn EncoderBackend>>,
    sink: S,
    events: Option<UnboundedSender<ExportEvent>>,
}

impl<S: FileSink> Exporter<S> {
    /// Create an exporter with no encoder backends registered
    pub fn new(config: ExportConfig, sink: S) -> Self {
        Self {
            config,
            backends: Vec::new(),
            sink,
            events: None,
        }
    }

    /// Register FFmpeg for WebM/MP4 and the in-process GIF encoder
    pub fn with_default_backends(self, ffmpeg_path: &str) -> Self {
        self.with_backend(Arc::new(FfmpegBackend::new(ffmpeg_path)))
            .with_backend(Arc::new(GifBackend::new()))
    }

    /// Add a backend; earlier registrations win for formats both handle
    pub fn with_backend(mut self, backend: Arc<dyn EncoderBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Send progress and the final outcome to `events`
    pub fn with_events(mut self, events: UnboundedSender<ExportEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Export `video` as framed by `scene`
    ///
    /// Emits `Progress` events as the job advances, then exactly one of
    /// `Completed` or `Failed`. The video's presentation state is restored
    /// whatever the outcome.
    pub async fn export(
        &mut self,
        video: Option<&mut dyn VideoSource>,
        scene: Option<&dyn FrameSource>,
        request: &ExportRequest,
    ) -> Result<ExportArtifact, ExportError> {
        let mut progress = ProgressTracker::new(self.events.clone());

        let result = self.run(video, scene, request, &mut progress).await;
        match &result {
            Ok(artifact) => {
                info!("🎉 Export complete! Output saved to: {:?}", artifact.path);
                progress.completed(artifact.clone());
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                progress.failed(e.to_string());
            }
        }
        result
    }

    async fn run(
        &mut self,
        video: Option<&mut dyn VideoSource>,
        scene: Option<&dyn FrameSource>,
        request: &ExportRequest,
        progress: &mut ProgressTracker,
    ) -> Result<ExportArtifact, ExportError> {
        let video = video.ok_or_else(|| ExportError::setup("No video available to export"))?;
        let scene = scene.ok_or_else(|| ExportError::setup("No video container available to export"))?;

        let (width, height) = scene.canvas_size(request.quality);
        if width == 0 || height == 0 {
            return Err(ExportError::CanvasUnavailable { width, height });
        }

        info!("🎬 Starting export");
        info!("   Format: {}", request.format);
        info!("   Quality: {} ({}x{})", request.quality, width, height);

        if request.format.is_snapshot() {
            return self.export_snapshot(video, scene, request, (width, height), progress);
        }

        let backend = select_backend(&self.backends, request.format)?;
        let fps = self.config.fps_for(request.format);
        let settings = EncoderSettings::new(request.format, width, height, fps, request.quality.bitrate());

        // ==========================================
        // STEP 1: LOCK AND REWIND
        // ==========================================

        let mut lock = PresentationLock::acquire(video);
        lock.pause();
        lock.seek(0.0)?;
        lock.set_controls_visible(false);
        progress.report(PROGRESS_PREPARED);

        // ==========================================
        // STEP 2: RECORD
        // ==========================================

        let mut recorder = StreamRecorder::new(backend);
        recorder.start(&settings)?;

        let captured = self
            .capture(&mut *lock, scene, &mut recorder, (width, height), fps, progress)
            .await;
        let frames = match captured {
            Ok(frames) => frames,
            Err(e) => {
                recorder.abort();
                return Err(e);
            }
        };

        // ==========================================
        // STEP 3: FINALIZE AND DELIVER
        // ==========================================

        let blob = recorder.stop()?;
        if blob.is_empty() {
            return Err(ExportError::EmptyResult);
        }
        debug!("Recorded {} frames into {} bytes of {}", frames, blob.len(), blob.mime_type());

        progress.report(PROGRESS_DONE);
        lock.release();

        self.deliver(blob, request, (width, height), frames)
    }

    /// Frame ticks run the compositor and encoder inline. Encoders that block
    /// push later ticks back; missed ticks are skipped rather than bunched.
    async fn capture(
        &self,
        video: &mut dyn VideoSource,
        scene: &dyn FrameSource,
        recorder: &mut StreamRecorder,
        canvas: (u32, u32),
        fps: u32,
        progress: &mut ProgressTracker,
    ) -> Result<u64, ExportError> {
        video.set_muted(false);
        video.play()?;
        progress.report(PROGRESS_RECORDING);

        let duration = video.duration();
        let limit = self.config.safety_limit(duration);
        let frame_period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        let progress_period = self.config.progress_interval().max(Duration::from_millis(1));

        let mut frame_ticker = interval(frame_period);
        frame_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut progress_ticker = interval_at(Instant::now() + progress_period, progress_period);
        let safety = sleep(limit);
        tokio::pin!(safety);

        let mut target = Frame::new_transparent(canvas.0, canvas.1);
        let mut frames = 0u64;

        let end = loop {
            tokio::select! {
                biased;

                _ = &mut safety => break CaptureEnd::TimedOut,

                _ = progress_ticker.tick() => {
                    progress.report(playback_progress(video.current_time(), duration));
                }

                _ = frame_ticker.tick() => {
                    scene.render_frame(video, &mut target)?;
                    recorder.push_frame(&target)?;
                    frames += 1;

                    if video.has_ended() || video.is_paused() {
                        break CaptureEnd::Playback;
                    }
                }
            }
        };

        match end {
            CaptureEnd::Playback => {
                debug!("Playback finished at {:.2}s, flushing encoder", video.current_time());
                sleep(self.config.finalize_delay()).await;
            }
            CaptureEnd::TimedOut => {
                warn!("Playback did not finish within {:?}, stopping capture", limit);
                video.pause();
            }
        }

        Ok(frames)
    }

    fn export_snapshot(
        &mut self,
        video: &mut dyn VideoSource,
        scene: &dyn FrameSource,
        request: &ExportRequest,
        canvas: (u32, u32),
        progress: &mut ProgressTracker,
    ) -> Result<ExportArtifact, ExportError> {
        let mut lock = PresentationLock::acquire(video);
        lock.pause();
        lock.set_controls_visible(false);
        progress.report(PROGRESS_PREPARED);

        let mut target = Frame::new_transparent(canvas.0, canvas.1);
        scene.render_frame(&mut *lock, &mut target)?;
        progress.report(PROGRESS_RECORDING);

        let blob = EncodedBlob::new(encode_png(&target)?, request.format.container_mime());
        progress.report(PROGRESS_DONE);
        lock.release();

        self.deliver(blob, request, canvas, 1)
    }

    fn deliver(
        &mut self,
        blob: EncodedBlob,
        request: &ExportRequest,
        canvas: (u32, u32),
        frames: u64,
    ) -> Result<ExportArtifact, ExportError> {
        let file_name = export_file_name(request.format.extension(), Utc::now());
        let path = self.sink.deliver(&blob, &file_name)?;

        Ok(ExportArtifact {
            path,
            file_name,
            format: request.format,
            quality: request.quality,
            mime_type: blob.mime_type().to_string(),
            width: canvas.0,
            height: canvas.1,
            frames,
            bytes: blob.len(),
        })
    }
}

fn encode_png(frame: &Frame) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(frame.as_rgba_bytes(), frame.width(), frame.height(), ColorType::Rgba8)
        .map_err(|e| RenderError::Encoding { reason: e.to_string() })?;
    Ok(bytes)
}
