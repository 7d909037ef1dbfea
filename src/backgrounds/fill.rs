use rayon::prelude::*;

use crate::{
    backgrounds::traits::{sample_stops, validate_stops, Backdrop, ColorStop},
    error::BackgroundError,
    video::{blend_over, Frame},
};

/// Single flat colour
pub struct SolidBackdrop {
    name: String,
    color: [u8; 4],
}

impl SolidBackdrop {
    pub fn new<S: Into<String>>(name: S, color: [u8; 4]) -> Self {
        Self { name: name.into(), color }
    }
}

impl Backdrop for SolidBackdrop {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Flat colour fill"
    }

    fn paint(&self, frame: &mut Frame) -> Result<(), BackgroundError> {
        paint_rows(frame, |_, _| self.color);
        Ok(())
    }
}

/// CSS-style linear gradient
///
/// `angle_deg` follows CSS: 0 points up, 90 points right, 135 points to the
/// bottom-right corner.
pub struct LinearGradient {
    name: String,
    description: String,
    angle_deg: f32,
    stops: Vec<ColorStop>,
}

impl LinearGradient {
    pub fn new<S: Into<String>>(name: S, angle_deg: f32, stops: Vec<ColorStop>) -> Self {
        let name = name.into();
        Self {
            description: format!("Linear gradient at {}deg", angle_deg),
            name,
            angle_deg,
            stops,
        }
    }
}

impl Backdrop for LinearGradient {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn paint(&self, frame: &mut Frame) -> Result<(), BackgroundError> {
        validate_stops(&self.stops)?;

        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let (sin, cos) = self.angle_deg.to_radians().sin_cos();
        let length = (w * sin).abs() + (h * cos).abs();
        let (cx, cy) = (w / 2.0, h / 2.0);

        paint_rows(frame, |x, y| {
            let (px, py) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
            let t = if length > 0.0 { (px * sin - py * cos) / length + 0.5 } else { 0.0 };
            sample_stops(&self.stops, t)
        });
        Ok(())
    }
}

/// Shape of a radial gradient's ending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialShape {
    Circle,
    Ellipse,
}

/// CSS-style radial gradient sized to the farthest corner
pub struct RadialGradient {
    name: String,
    description: String,
    shape: RadialShape,
    center: (f32, f32),
    stops: Vec<ColorStop>,
}

impl RadialGradient {
    /// `center` is fractional, `(0.5, 0.5)` is the middle of the surface
    pub fn new<S: Into<String>>(name: S, shape: RadialShape, center: (f32, f32), stops: Vec<ColorStop>) -> Self {
        let name = name.into();
        Self {
            description: format!("Radial {:?} gradient", shape).to_lowercase(),
            name,
            shape,
            center,
            stops,
        }
    }
}

impl Backdrop for RadialGradient {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn paint(&self, frame: &mut Frame) -> Result<(), BackgroundError> {
        validate_stops(&self.stops)?;

        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let (cx, cy) = (self.center.0 * w, self.center.1 * h);
        let reach_x = cx.max(w - cx).max(f32::EPSILON);
        let reach_y = cy.max(h - cy).max(f32::EPSILON);

        let shape = self.shape;
        let circle_radius = (reach_x * reach_x + reach_y * reach_y).sqrt();
        let (rx, ry) = (reach_x * std::f32::consts::SQRT_2, reach_y * std::f32::consts::SQRT_2);

        paint_rows(frame, |x, y| {
            let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
            let t = match shape {
                RadialShape::Circle => (dx * dx + dy * dy).sqrt() / circle_radius,
                RadialShape::Ellipse => ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt(),
            };
            sample_stops(&self.stops, t)
        });
        Ok(())
    }
}

/// Blend `color_at(x, y)` over every pixel, one rayon task per row
pub(crate) fn paint_rows<F>(frame: &mut Frame, color_at: F)
where
    F: Fn(u32, u32) -> [u8; 4] + Sync,
{
    let width = frame.width() as usize;
    if width == 0 {
        return;
    }
    let pixels: &mut [u8] = frame.as_image_mut();
    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                blend_over(pixel, color_at(x as u32, y as u32), 1.0);
            }
        });
}
