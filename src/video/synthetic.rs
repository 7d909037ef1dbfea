use crate::error::VideoError;
use crate::video::clock::PlaybackClock;
use crate::video::source::VideoSource;
use crate::video::types::{Frame, VideoMetadata};

/// Generated test-pattern clip
///
/// Each frame is a hue sweep with a white bar travelling left to right, so
/// exported output visibly tracks playback. Used for demos and tests.
pub struct SyntheticVideo {
    width: u32,
    height: u32,
    fps: f64,
    reported_size: Option<(u32, u32)>,
    clock: PlaybackClock,
    interrupt_at: Option<f64>,
    fail_playback: bool,
    muted: bool,
    controls_visible: bool,
    cached: Option<(u64, Frame)>,
}

impl SyntheticVideo {
    pub fn new(width: u32, height: u32, fps: f64, duration: f64) -> Self {
        Self {
            width,
            height,
            fps,
            reported_size: None,
            clock: PlaybackClock::new(duration),
            interrupt_at: None,
            fail_playback: false,
            muted: true,
            controls_visible: true,
            cached: None,
        }
    }

    /// Loop forever instead of ending
    pub fn looping(mut self) -> Self {
        self.clock.set_looping(true);
        self
    }

    /// Report a different intrinsic size than the frames actually decoded
    pub fn reporting_natural_size(mut self, width: u32, height: u32) -> Self {
        self.reported_size = Some((width, height));
        self
    }

    /// Simulate someone pausing playback once it reaches `seconds`
    pub fn interrupted_at(mut self, seconds: f64) -> Self {
        self.interrupt_at = Some(seconds);
        self
    }

    /// Make every `play()` call fail
    pub fn failing_playback(mut self) -> Self {
        self.fail_playback = true;
        self
    }

    fn interrupted(&self) -> bool {
        match self.interrupt_at {
            Some(limit) => self.clock.is_running() && self.clock.current_time() >= limit,
            None => false,
        }
    }

    fn render_pattern(&self, index: u64) -> Frame {
        let total = (self.clock.duration() * self.fps).max(1.0);
        let progress = (index as f64 / total).fract() as f32;
        let [r, g, b] = hsv_to_rgb(progress * 360.0, 0.7, 0.9);
        let mut frame = Frame::new_filled(self.width, self.height, [r, g, b, 255]);

        let bar_width = (self.width / 10).max(1);
        let bar_x = ((self.width.saturating_sub(bar_width)) as f32 * progress) as u32;
        for y in 0..self.height {
            for x in bar_x..(bar_x + bar_width).min(self.width) {
                frame.set_pixel(x, y, [255, 255, 255, 255]);
            }
        }
        frame
    }
}

impl VideoSource for SyntheticVideo {
    fn metadata(&self) -> VideoMetadata {
        let (width, height) = self.reported_size.unwrap_or((self.width, self.height));
        VideoMetadata {
            width,
            height,
            fps: self.fps,
            duration: self.clock.duration(),
        }
    }

    fn current_time(&self) -> f64 {
        match self.interrupt_at {
            Some(limit) if self.interrupted() => limit,
            _ => self.clock.current_time(),
        }
    }

    fn seek(&mut self, seconds: f64) -> Result<(), VideoError> {
        if !seconds.is_finite() {
            return Err(VideoError::InvalidParameters {
                details: format!("seek target {}", seconds),
            });
        }
        self.clock.seek(seconds);
        Ok(())
    }

    fn play(&mut self) -> Result<(), VideoError> {
        if self.fail_playback {
            return Err(VideoError::PlaybackFailed {
                reason: "playback was blocked".to_string(),
            });
        }
        self.interrupt_at = self.interrupt_at.filter(|limit| self.clock.current_time() < *limit);
        self.clock.play();
        Ok(())
    }

    fn pause(&mut self) {
        if self.interrupted() {
            let limit = self.current_time();
            self.clock.pause();
            self.clock.seek(limit);
        } else {
            self.clock.pause();
        }
    }

    fn is_paused(&self) -> bool {
        !self.clock.is_running() || self.clock.has_ended() || self.interrupted()
    }

    fn has_ended(&self) -> bool {
        self.clock.has_ended()
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
        if self.width == 0 || self.height == 0 {
            return Ok(None);
        }

        let index = (self.current_time() * self.fps).floor() as u64;
        let stale = !matches!(&self.cached, Some((cached, _)) if *cached == index);
        if stale {
            let frame = self.render_pattern(index);
            self.cached = Some((index, frame));
        }
        Ok(self.cached.as_ref().map(|(_, frame)| frame))
    }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}
