//! Time formatting helpers.

use std::fmt::Write;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
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

/// Format a whole-day lock period, e.g. `"90d"` or `"90d + 10d buffer"`.
pub fn format_days(duration_days: u64, buffer_days: u64) -> String {
    let mut out = format!("{duration_days}d");
    if buffer_days > 0 {
        let _ = write!(out, " + {buffer_days}d buffer");
    }
    out
}
