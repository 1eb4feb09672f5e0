//! Time formatting helpers.

use std::time::Duration;

/// Format a duration to a short human-readable string.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Whole minutes, rounded up, for "about N minutes" style estimates.
pub fn format_minutes(duration: Duration) -> String {
    let minutes = duration.as_secs().div_ceil(60);
    if minutes == 1 {
        "~1 minute".to_string()
    } else {
        format!("~{minutes} minutes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(600)), "10m 0s");
        assert_eq!(format_duration(Duration::from_secs(7260)), "2h 1m");
        assert_eq!(format_duration(Duration::from_secs(90000)), "1d 1h");
    }

    #[test]
    fn minutes_round_up() {
        assert_eq!(format_minutes(Duration::from_secs(0)), "~0 minutes");
        assert_eq!(format_minutes(Duration::from_secs(12)), "~1 minute");
        assert_eq!(format_minutes(Duration::from_secs(600)), "~10 minutes");
        assert_eq!(format_minutes(Duration::from_secs(601)), "~11 minutes");
    }
}
