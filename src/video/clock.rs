use tokio::time::Instant;

/// Wall-clock playback position for a media source
///
/// Time is read from `tokio::time`, so a paused test runtime drives playback
/// deterministically.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    duration: f64,
    anchor: f64,
    started_at: Option<Instant>,
    looping: bool,
}

impl PlaybackClock {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            anchor: 0.0,
            started_at: None,
            looping: false,
        }
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Position in seconds, clamped to the clip unless looping
    pub fn current_time(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let raw = self.anchor + elapsed;

        if !self.duration.is_finite() || self.duration <= 0.0 {
            return raw;
        }
        if self.looping {
            raw % self.duration
        } else {
            raw.min(self.duration)
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_ended(&self) -> bool {
        !self.looping
            && self.duration.is_finite()
            && self.current_time() >= self.duration
    }

    /// Start advancing; an ended clip restarts from zero like a media element
    pub fn play(&mut self) {
        if self.has_ended() {
            self.anchor = 0.0;
            self.started_at = None;
        }
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        self.anchor = self.current_time();
        self.started_at = None;
    }

    pub fn seek(&mut self, seconds: f64) {
        let upper = if self.duration.is_finite() { self.duration } else { f64::MAX };
        self.anchor = seconds.clamp(0.0, upper);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }
}
