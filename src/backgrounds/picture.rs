use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::{imageops, RgbaImage};
use tracing::debug;

use crate::{
    backgrounds::{fill::paint_rows, traits::Backdrop},
    error::BackgroundError,
    video::Frame,
};

/// Picture file scaled to cover the surface, like `background-size: cover`
///
/// The file is decoded on first paint. An unreadable file makes every paint
/// fail, which the compositor treats as a missing background layer.
pub struct ImageBackdrop {
    name: String,
    path: PathBuf,
    decoded: OnceLock<Result<RgbaImage, String>>,
}

impl ImageBackdrop {
    pub fn new<S: Into<String>, P: AsRef<Path>>(name: S, path: P) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
            decoded: OnceLock::new(),
        }
    }

    fn source(&self) -> Result<&RgbaImage, BackgroundError> {
        let decoded = self.decoded.get_or_init(|| {
            debug!("Decoding background image {:?}", self.path);
            image::open(&self.path)
                .map(|img| img.to_rgba8())
                .map_err(|e| e.to_string())
        });

        decoded.as_ref().map_err(|reason| BackgroundError::ImageUnavailable {
            path: self.path.display().to_string(),
            reason: reason.clone(),
        })
    }
}

impl Backdrop for ImageBackdrop {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Image file scaled to cover"
    }

    fn paint(&self, frame: &mut Frame) -> Result<(), BackgroundError> {
        let source = self.source()?;
        let covered = cover(source, frame.width(), frame.height());
        paint_rows(frame, |x, y| covered.get_pixel(x, y).0);
        Ok(())
    }
}

/// Scale preserving aspect ratio until both sides cover the target, then
/// centre-crop
fn cover(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (sw, sh) = source.dimensions();
    if sw == 0 || sh == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }

    let scale = (width as f64 / sw as f64).max(height as f64 / sh as f64);
    let scaled_w = ((sw as f64 * scale).ceil() as u32).max(width);
    let scaled_h = ((sh as f64 * scale).ceil() as u32).max(height);
    let scaled = imageops::resize(source, scaled_w, scaled_h, imageops::FilterType::Triangle);

    let x = (scaled_w - width) / 2;
    let y = (scaled_h - height) / 2;
    imageops::crop_imm(&scaled, x, y, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    #[test]
    fn test_missing_image_fails_to_paint() {
        let backdrop = ImageBackdrop::new("photo", "/no/such/background.png");
        let mut frame = Frame::new_transparent(8, 8);
        let err = backdrop.paint(&mut frame).unwrap_err();
        assert!(matches!(err, BackgroundError::ImageUnavailable { .. }));
    }

    #[test]
    fn test_image_covers_surface() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bg.png");
        RgbaImage::from_pixel(4, 2, Rgba([0, 128, 255, 255])).save(&path).unwrap();

        let backdrop = ImageBackdrop::new("photo", &path);
        let mut frame = Frame::new_transparent(10, 10);
        backdrop.paint(&mut frame).unwrap();

        assert_eq!(frame.get_pixel(0, 0), [0, 128, 255, 255]);
        assert_eq!(frame.get_pixel(9, 9), [0, 128, 255, 255]);
    }

    #[test]
    fn test_cover_crops_to_exact_size() {
        let source = RgbaImage::new(16, 9);
        assert_eq!(cover(&source, 10, 10).dimensions(), (10, 10));
        assert_eq!(cover(&source, 30, 5).dimensions(), (30, 5));
    }
}
