use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    backgrounds::Backdrop,
    composition::layout::{ContainerLayout, QualityTier},
    error::RenderError,
    video::{blend_over, Frame, VideoSource},
};

/// Anything that can draw one export frame of a scene
///
/// Called once per encoder tick. Implementations read the video's current
/// frame and paint the full composition onto `target`, which is already sized
/// to the output canvas.
pub trait FrameSource {
    /// Geometry of the scene in layout pixels
    fn layout(&self) -> ContainerLayout;

    fn render_frame(&self, video: &mut dyn VideoSource, target: &mut Frame) -> Result<(), RenderError>;

    /// Canvas size for a given tier
    fn canvas_size(&self, quality: QualityTier) -> (u32, u32) {
        quality.canvas_size(&self.layout())
    }
}

/// Draws the styled container: backdrop, padded video, rounded corners
pub struct FrameCompositor {
    layout: ContainerLayout,
    backdrop: Box<dyn Backdrop>,
    base_color: [u8; 4],
}

const BLACK: [u8; 4] = [0, 0, 0, 255];

impl FrameCompositor {
    pub fn new(layout: ContainerLayout, backdrop: Box<dyn Backdrop>) -> Self {
        Self {
            layout,
            backdrop,
            base_color: [255, 255, 255, 255],
        }
    }

    /// Colour laid down before the backdrop, visible through translucent stops
    pub fn with_base_color(mut self, color: [u8; 4]) -> Self {
        self.base_color = color;
        self
    }

    pub fn backdrop_name(&self) -> &str {
        self.backdrop.name()
    }

    /// Render a single composited frame at the given tier
    pub fn snapshot(&self, video: &mut dyn VideoSource, quality: QualityTier) -> Result<Frame, RenderError> {
        let (width, height) = self.canvas_size(quality);
        let mut frame = Frame::new_transparent(width, height);
        self.render_frame(video, &mut frame)?;
        Ok(frame)
    }

    /// Destination rectangle of the video on a `canvas` surface, in canvas pixels
    fn video_rect(&self, natural: (u32, u32), canvas: (u32, u32)) -> VideoRect {
        let (bx, by, bw, bh) = self.layout.video_box();

        let (nw, nh) = if natural.0 == 0 || natural.1 == 0 {
            (bw, bh)
        } else {
            (natural.0 as f64, natural.1 as f64)
        };

        // object-fit: contain
        let fit = if nw > 0.0 && nh > 0.0 { (bw / nw).min(bh / nh) } else { 0.0 };
        let (dw, dh) = (nw * fit, nh * fit);
        let (dx, dy) = (bx + (bw - dw) / 2.0, by + (bh - dh) / 2.0);

        let sx = canvas.0 as f64 / self.layout.width;
        let sy = canvas.1 as f64 / self.layout.height;

        VideoRect {
            x: (dx * sx).round() as i64,
            y: (dy * sy).round() as i64,
            width: (dw * sx).round().max(0.0) as u32,
            height: (dh * sy).round().max(0.0) as u32,
            radius: (self.layout.corner_radius * sx.min(sy)) as f32,
        }
    }

    fn paint_background(&self, target: &mut Frame) {
        target.fill(self.base_color);
        if let Err(e) = self.backdrop.paint(target) {
            warn!("Background '{}' could not be painted, continuing without it: {}", self.backdrop.name(), e);
            target.clear();
        }
    }
}

impl FrameSource for FrameCompositor {
    fn layout(&self) -> ContainerLayout {
        self.layout
    }

    fn render_frame(&self, video: &mut dyn VideoSource, target: &mut Frame) -> Result<(), RenderError> {
        self.layout.validate()?;
        let (width, height) = target.dimensions();
        if width == 0 || height == 0 || self.layout.width <= 0.0 || self.layout.height <= 0.0 {
            return Err(RenderError::EmptySurface { width, height });
        }

        self.paint_background(target);

        let rect = self.video_rect(video.natural_size(), (width, height));
        if rect.width == 0 || rect.height == 0 {
            debug!("Video box collapsed to nothing, drawing background only");
            return Ok(());
        }

        match video.current_frame()? {
            Some(frame) => {
                let scaled = frame.resized(rect.width, rect.height);
                draw_clipped(target, &rect, |x, y| scaled.get_pixel(x, y));
            }
            None => draw_clipped(target, &rect, |_, _| BLACK),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VideoRect {
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    radius: f32,
}

impl VideoRect {
    /// Fraction of the pixel at local (x, y) inside the rounded rectangle
    fn coverage(&self, x: u32, y: u32) -> f32 {
        let (w, h) = (self.width as f32, self.height as f32);
        let r = self.radius.min(w / 2.0).min(h / 2.0);
        if r <= 0.0 {
            return 1.0;
        }

        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let cx = if px < r { r } else if px > w - r { w - r } else { return 1.0 };
        let cy = if py < r { r } else if py > h - r { h - r } else { return 1.0 };

        let distance = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
        (r - distance + 0.5).clamp(0.0, 1.0)
    }
}

fn draw_clipped<F>(target: &mut Frame, rect: &VideoRect, source: F)
where
    F: Fn(u32, u32) -> [u8; 4] + Sync,
{
    let (canvas_w, canvas_h) = target.dimensions();
    let x_start = rect.x.max(0) as u32;
    let x_end = (rect.x + rect.width as i64).clamp(0, canvas_w as i64) as u32;
    let y_start = rect.y.max(0) as u32;
    let y_end = (rect.y + rect.height as i64).clamp(0, canvas_h as i64) as u32;
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    let stride = canvas_w as usize * 4;
    let pixels: &mut [u8] = target.as_image_mut();
    pixels
        .par_chunks_mut(stride)
        .enumerate()
        .skip(y_start as usize)
        .take((y_end - y_start) as usize)
        .for_each(|(y, row)| {
            let local_y = (y as i64 - rect.y) as u32;
            for x in x_start..x_end {
                let local_x = (x as i64 - rect.x) as u32;
                let coverage = rect.coverage(local_x, local_y);
                let offset = x as usize * 4;
                blend_over(&mut row[offset..offset + 4], source(local_x, local_y), coverage);
            }
        });
}
