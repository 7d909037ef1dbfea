use serde::{Deserialize, Serialize};
use tracing::debug;

/// Two splits closer than this are considered the same cut
pub const SPLIT_TOLERANCE: f64 = 0.1;

/// Step used by the seek buttons
pub const SEEK_STEP: f64 = 5.0;

/// User-marked cut positions on the editing timeline
///
/// Always sorted ascending, with no two points within [`SPLIT_TOLERANCE`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitTimeline {
    points: Vec<f64>,
}

/// One contiguous range between cuts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl SplitTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a cut at `time`; returns `false` when it duplicates an existing one
    pub fn add_split(&mut self, time: f64) -> bool {
        if !time.is_finite() || time < 0.0 {
            return false;
        }
        if self.points.iter().any(|p| (p - time).abs() < SPLIT_TOLERANCE) {
            debug!("Split at {:.2}s ignored, too close to an existing split", time);
            return false;
        }

        let index = self.points.partition_point(|p| *p < time);
        self.points.insert(index, time);
        true
    }

    /// Remove the cut at `index`
    pub fn remove_split(&mut self, index: usize) -> Option<f64> {
        (index < self.points.len()).then(|| self.points.remove(index))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Nearest cut strictly before `time`, or the start of the clip
    pub fn previous_split(&self, time: f64) -> f64 {
        self.points.iter().rev().copied().find(|p| *p < time).unwrap_or(0.0)
    }

    /// Nearest cut strictly after `time`, or the end of the clip
    pub fn next_split(&self, time: f64, duration: f64) -> f64 {
        self.points.iter().copied().find(|p| *p > time).unwrap_or(duration)
    }

    /// Ranges between consecutive cuts, covering `0..duration`
    ///
    /// Cuts at or beyond `duration` are ignored.
    pub fn segments(&self, duration: f64) -> Vec<Segment> {
        if !duration.is_finite() || duration <= 0.0 {
            return Vec::new();
        }

        let mut segments = Vec::with_capacity(self.points.len() + 1);
        let mut start = 0.0;
        for &point in self.points.iter().filter(|p| **p > 0.0 && **p < duration) {
            segments.push(Segment { start, end: point });
            start = point;
        }
        segments.push(Segment { start, end: duration });
        segments
    }
}

/// Jump back by [`SEEK_STEP`], stopping at the start
pub fn seek_back(time: f64) -> f64 {
    (time - SEEK_STEP).max(0.0)
}

/// Jump forward by [`SEEK_STEP`], stopping at `duration`
pub fn seek_forward(time: f64, duration: f64) -> f64 {
    (time + SEEK_STEP).min(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_duplicate_split_is_ignored() {
        let mut timeline = SplitTimeline::new();
        assert!(timeline.add_split(4.5));
        assert!(!timeline.add_split(4.55));
        assert_eq!(timeline.points(), &[4.5]);
    }

    #[test]
    fn test_splits_stay_sorted() {
        let mut timeline = SplitTimeline::new();
        for t in [7.0, 1.0, 3.2, 9.9] {
            timeline.add_split(t);
        }
        assert_eq!(timeline.points(), &[1.0, 3.2, 7.0, 9.9]);
    }

    #[test]
    fn test_remove_by_index_keeps_order() {
        let mut timeline = SplitTimeline::new();
        for t in [1.0, 2.0, 3.0] {
            timeline.add_split(t);
        }
        assert_eq!(timeline.remove_split(1), Some(2.0));
        assert_eq!(timeline.points(), &[1.0, 3.0]);
        assert_eq!(timeline.remove_split(5), None);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_invalid_times_are_rejected() {
        let mut timeline = SplitTimeline::new();
        assert!(!timeline.add_split(f64::NAN));
        assert!(!timeline.add_split(-1.0));
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_jump_to_neighbouring_splits() {
        let mut timeline = SplitTimeline::new();
        timeline.add_split(2.0);
        timeline.add_split(6.0);

        assert_eq!(timeline.previous_split(5.0), 2.0);
        assert_eq!(timeline.previous_split(2.0), 0.0);
        assert_eq!(timeline.next_split(2.0, 10.0), 6.0);
        assert_eq!(timeline.next_split(6.5, 10.0), 10.0);
    }

    #[test]
    fn test_seek_is_clamped() {
        assert_eq!(seek_back(3.0), 0.0);
        assert_eq!(seek_back(8.0), 3.0);
        assert_eq!(seek_forward(8.0, 10.0), 10.0);
        assert_eq!(seek_forward(1.0, 10.0), 6.0);
    }

    #[test]
    fn test_segments_cover_clip() {
        let mut timeline = SplitTimeline::new();
        timeline.add_split(3.0);
        timeline.add_split(12.0);

        let segments = timeline.segments(10.0);
        assert_eq!(
            segments,
            vec![Segment { start: 0.0, end: 3.0 }, Segment { start: 3.0, end: 10.0 }]
        );
        assert!(timeline.segments(f64::INFINITY).is_empty());
    }
}
