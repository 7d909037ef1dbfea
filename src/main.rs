use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use screen_studio::{
    backgrounds::{palette, Backdrop, BackdropRegistry, ImageBackdrop},
    composition::{ContainerLayout, FrameCompositor, QualityTier},
    config::Config,
    export::{DiskSink, ExportEvent, ExportRequest, Exporter},
    recorder::{ExportFormat, FfmpegBackend},
    video::{FfmpegVideo, SyntheticVideo, VideoSource},
};

#[derive(Parser)]
#[command(
    name = "screen-studio",
    version,
    about = "Export screen recordings framed on a styled backdrop",
    long_about = "Screen-Studio plays a recorded clip through a styled container (backdrop, padding, rounded corners) and exports it as WebM, MP4, GIF or a PNG snapshot."
)]
struct Cli {
    /// Recorded clip to export
    #[arg(short, long, conflicts_with = "demo", required_unless_present_any = ["demo", "list_backgrounds"])]
    input: Option<PathBuf>,

    /// Export a generated test-pattern clip of this many seconds instead
    #[arg(long, value_name = "SECS")]
    demo: Option<f64>,

    /// Output format (webm, mp4, gif, png)
    #[arg(short, long)]
    format: Option<ExportFormat>,

    /// Output quality (720p, 1080p, 2160p)
    #[arg(short, long)]
    quality: Option<QualityTier>,

    /// Backdrop name, see --list-backgrounds
    #[arg(short, long)]
    background: Option<String>,

    /// Padding around the video in layout pixels
    #[arg(short, long)]
    padding: Option<f64>,

    /// Save to exactly this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for exports saved under their generated name
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List available backdrops and exit
    #[arg(long)]
    list_backgrounds: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let registry = BackdropRegistry::new();
    if cli.list_backgrounds {
        for name in registry.available_backdrops() {
            if let Some(backdrop) = registry.get_backdrop(&name) {
                println!("{:<12} {}", name, backdrop.description());
            }
        }
        return Ok(());
    }

    info!("Starting Screen-Studio v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    apply_overrides(&mut config, &cli);
    config.validate().map_err(|e| anyhow!(e.user_message()))?;

    let mut video: Box<dyn VideoSource> = match (&cli.input, cli.demo) {
        (Some(path), _) => Box::new(
            FfmpegVideo::open(path, &config.recorder.ffmpeg_path, &config.recorder.ffprobe_path)
                .with_context(|| format!("opening {:?}", path))?,
        ),
        (None, Some(seconds)) => {
            info!("Using a {:.1}s demo clip", seconds);
            Box::new(SyntheticVideo::new(1280, 720, 30.0, seconds))
        }
        (None, None) => return Err(anyhow!("either --input or --demo is required")),
    };

    let compositor = build_compositor(&config, &registry, video.natural_size())?;
    info!("Background: {}", compositor.backdrop_name());

    let request = ExportRequest::new(
        cli.format.unwrap_or(config.export.default_format),
        cli.quality.unwrap_or(config.export.default_quality),
    );

    if matches!(request.format, ExportFormat::Webm | ExportFormat::Mp4)
        && !FfmpegBackend::new(config.recorder.ffmpeg_path.as_str()).is_available()
    {
        return Err(anyhow!(
            "'{}' is not runnable; {} export needs FFmpeg. Try --format gif or set recorder.ffmpeg_path.",
            config.recorder.ffmpeg_path,
            request.format
        ));
    }

    let mut sink = DiskSink::new(&config.output.download_dir);
    if let Some(output) = &cli.output {
        sink = sink.with_destination(output);
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut exporter = Exporter::new(config.export.clone(), sink)
        .with_default_backends(&config.recorder.ffmpeg_path)
        .with_events(events_tx);

    let reporter = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                ExportEvent::Progress(percent) => info!("📊 Progress: {}%", percent),
                ExportEvent::Completed(artifact) => {
                    info!("   {}x{}, {} frames, {} bytes", artifact.width, artifact.height, artifact.frames, artifact.bytes);
                }
                ExportEvent::Failed(reason) => warn!("❌ {}", reason),
            }
        }
    });

    let source: &mut dyn VideoSource = video.as_mut();
    let result = exporter.export(Some(source), Some(&compositor), &request).await;

    // Closing the channel lets the reporter drain and finish
    drop(exporter);
    if let Err(e) = reporter.await {
        warn!("Progress reporter stopped early: {}", e);
    }

    let artifact = result.map_err(|e| anyhow!(screen_studio::StudioError::from(e).user_message()))?;
    println!("{}", artifact.path.display());
    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(background) = &cli.background {
        config.compositor.background = background.clone();
        config.compositor.background_image = None;
    }
    if let Some(padding) = cli.padding {
        config.compositor.padding = padding;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.download_dir = dir.clone();
    }
}

fn build_compositor(
    config: &Config,
    registry: &BackdropRegistry,
    (video_width, video_height): (u32, u32),
) -> Result<FrameCompositor> {
    let settings = &config.compositor;

    let backdrop: Box<dyn Backdrop> = match &settings.background_image {
        Some(path) => Box::new(ImageBackdrop::new("image", path)),
        None => registry.get_backdrop(&settings.background).ok_or_else(|| {
            anyhow!(
                "Background '{}' not found. Run with --list-backgrounds to see the presets.",
                settings.background
            )
        })?,
    };

    let base_color = palette::parse_hex(&settings.base_color)
        .ok_or_else(|| anyhow!("Invalid base colour: {}", settings.base_color))?;

    let layout = ContainerLayout::fit_width(video_width, video_height, settings.preview_width, settings.padding)
        .with_corner_radius(settings.corner_radius);

    Ok(FrameCompositor::new(layout, backdrop).with_base_color(base_color))
}
