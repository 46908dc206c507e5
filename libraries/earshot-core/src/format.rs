//! Human-readable time formatting

/// Format seconds as `m:ss`.
///
/// Fractions are truncated; negative and non-finite input renders as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let safe = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", safe / 60, safe % 60)
}
