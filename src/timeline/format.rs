/// Format a playback position as `MM:SS.cc`
///
/// Hundredths are truncated, not rounded, so the display never runs ahead of
/// the playhead. Non-finite input shows `00:00.00` and negative input is
/// clamped to zero. Minutes keep growing past 99.
pub fn format_time_display(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "00:00.00".to_string();
    }

    let centis = (seconds.max(0.0) * 100.0).floor();
    let total_centis = if centis >= u64::MAX as f64 { u64::MAX } else { centis as u64 };

    let minutes = total_centis / 6000;
    let secs = (total_centis / 100) % 60;
    let hundredths = total_centis % 100;
    format!("{:02}:{:02}.{:02}", minutes, secs, hundredths)
}

/// Whole-second `MM:SS` counter shown while recording
pub fn format_elapsed(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_minutes_seconds_hundredths() {
        assert_eq!(format_time_display(0.0), "00:00.00");
        assert_eq!(format_time_display(65.25), "01:05.25");
        assert_eq!(format_time_display(59.999), "00:59.99");
        assert_eq!(format_time_display(600.5), "10:00.50");
    }

    #[test]
    fn test_non_finite_and_negative_inputs() {
        assert_eq!(format_time_display(f64::NAN), "00:00.00");
        assert_eq!(format_time_display(f64::INFINITY), "00:00.00");
        assert_eq!(format_time_display(f64::NEG_INFINITY), "00:00.00");
        assert_eq!(format_time_display(-3.5), "00:00.00");
    }

    #[test]
    fn test_elapsed_counter() {
        assert_eq!(format_elapsed(0.0), "00:00");
        assert_eq!(format_elapsed(125.9), "02:05");
        assert_eq!(format_elapsed(f64::NAN), "00:00");
    }

    #[test]
    fn test_long_clips_grow_minutes() {
        assert_eq!(format_time_display(100.0 * 60.0 + 1.0), "100:01.00");
    }
}
