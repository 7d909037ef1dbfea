use serde::{Deserialize, Serialize};

use crate::{error::BackgroundError, video::types::Frame};

/// Core trait for the decorative fill painted behind the video
pub trait Backdrop: Send + Sync {
    /// Returns the unique name of this backdrop
    fn name(&self) -> &str;

    /// Returns a human-readable description of this backdrop
    fn description(&self) -> &str;

    /// Paint the backdrop over the whole surface
    ///
    /// Painting blends source-over onto whatever the surface already holds.
    /// An error means nothing usable could be painted; callers decide whether
    /// to carry on without a background.
    fn paint(&self, frame: &mut Frame) -> Result<(), BackgroundError>;
}

/// One colour stop of a gradient, `offset` in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: [u8; 4],
}

impl ColorStop {
    pub const fn new(offset: f32, color: [u8; 4]) -> Self {
        Self { offset, color }
    }
}

/// Interpolate a sorted stop list at `t`
pub fn sample_stops(stops: &[ColorStop], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let Some(first) = stops.first() else {
        return [0, 0, 0, 0];
    };
    if t <= first.offset {
        return first.color;
    }

    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            let f = (t - a.offset) / span;
            let mut out = [0u8; 4];
            for c in 0..4 {
                out[c] = (a.color[c] as f32 + (b.color[c] as f32 - a.color[c] as f32) * f).round() as u8;
            }
            return out;
        }
    }

    stops[stops.len() - 1].color
}

/// Reject stop lists that cannot be interpolated
pub fn validate_stops(stops: &[ColorStop]) -> Result<(), BackgroundError> {
    if stops.is_empty() {
        return Err(BackgroundError::InvalidConfig {
            details: "gradient needs at least one colour stop".to_string(),
        });
    }
    let ordered = stops.windows(2).all(|pair| pair[0].offset <= pair[1].offset);
    let in_range = stops.iter().all(|s| (0.0..=1.0).contains(&s.offset));
    if !ordered || !in_range {
        return Err(BackgroundError::InvalidConfig {
            details: "colour stop offsets must be ascending within 0..=1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_endpoints_and_midpoint() {
        let stops = [
            ColorStop::new(0.0, [0, 0, 0, 255]),
            ColorStop::new(1.0, [200, 100, 50, 255]),
        ];
        assert_eq!(sample_stops(&stops, 0.0), [0, 0, 0, 255]);
        assert_eq!(sample_stops(&stops, 1.0), [200, 100, 50, 255]);
        assert_eq!(sample_stops(&stops, 0.5), [100, 50, 25, 255]);
        assert_eq!(sample_stops(&stops, 7.0), [200, 100, 50, 255]);
    }

    #[test]
    fn test_validate_rejects_unordered_stops() {
        let stops = [
            ColorStop::new(0.8, [0, 0, 0, 255]),
            ColorStop::new(0.2, [0, 0, 0, 255]),
        ];
        assert!(validate_stops(&stops).is_err());
        assert!(validate_stops(&[]).is_err());
    }
}
