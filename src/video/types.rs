use image::{imageops, ImageBuffer, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Represents a single RGBA video frame or drawing surface
///
/// This is a thin wrapper around an RGBA image buffer that provides the
/// pixel operations used by backdrops and the compositor.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbaImage,
}

impl Frame {
    /// Create a new frame from an RGBA image buffer
    pub fn new(buffer: RgbaImage) -> Self {
        Self { buffer }
    }

    /// Create a fully transparent frame
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgba(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (returns RGBA array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.buffer.put_pixel(x, y, Rgba(color));
    }

    /// Fill the whole surface with one color
    pub fn fill(&mut self, color: [u8; 4]) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = Rgba(color);
        }
    }

    /// Reset every pixel to transparent black
    pub fn clear(&mut self) {
        self.fill([0, 0, 0, 0]);
    }

    /// Source-over blend `color` onto the pixel at (x, y), scaled by `coverage`
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 4], coverage: f32) {
        let dst = self.buffer.get_pixel_mut(x, y);
        blend_over(&mut dst.0, color, coverage);
    }

    /// Resize to exactly `width` x `height` with a triangle filter
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Frame::new(imageops::resize(&self.buffer, width, height, imageops::FilterType::Triangle))
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn as_image_mut(&mut self) -> &mut RgbaImage {
        &mut self.buffer
    }

    /// Raw RGBA bytes, row-major
    pub fn as_rgba_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Create a frame from raw RGBA bytes
    pub fn from_rgba_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }
}

/// Source-over blend of `src` onto one RGBA pixel
pub fn blend_over(dst: &mut [u8], src: [u8; 4], coverage: f32) {
    let src_a = (src[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }

    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    for c in 0..3 {
        let blended = (src[c] as f32 * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Snapshot of the presentation state a caller expects back after an export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresentationState {
    pub paused: bool,
    pub muted: bool,
    pub controls_visible: bool,
    pub current_time: f64,
}

/// Basic stream facts reported by a video source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_opaque_pixel_replaces_destination() {
        let mut frame = Frame::new_filled(2, 2, [0, 0, 255, 255]);
        frame.blend_pixel(1, 1, [255, 0, 0, 255], 1.0);
        assert_eq!(frame.get_pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(frame.get_pixel(0, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn test_blend_half_coverage_mixes_colors() {
        let mut frame = Frame::new_filled(1, 1, [0, 0, 0, 255]);
        frame.blend_pixel(0, 0, [200, 100, 0, 255], 0.5);
        let [r, g, b, a] = frame.get_pixel(0, 0);
        assert_eq!((r, g, b, a), (100, 50, 0, 255));
    }

    #[test]
    fn test_blend_onto_transparent_keeps_source_color() {
        let mut frame = Frame::new_transparent(1, 1);
        frame.blend_pixel(0, 0, [10, 20, 30, 255], 0.5);
        let [r, g, b, a] = frame.get_pixel(0, 0);
        assert_eq!((r, g, b), (10, 20, 30));
        assert_eq!(a, 128);
    }

    #[test]
    fn test_rgba_bytes_roundtrip_dimensions() {
        let frame = Frame::new_filled(3, 2, [1, 2, 3, 4]);
        let bytes = frame.as_rgba_bytes().to_vec();
        assert_eq!(bytes.len(), 3 * 2 * 4);
        assert!(Frame::from_rgba_bytes(3, 2, bytes.clone()).is_some());
        assert!(Frame::from_rgba_bytes(4, 2, bytes).is_none());
    }
}
