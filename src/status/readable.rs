//! Human-readable formatting for sizes, speeds, and durations.
//!
//! For status renderers that poll [`TransferStatus`](crate::TransferStatus)
//! objects; the raw numbers stay available for callers that bring their own
//! formatting.

use std::time::Duration;

const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Formats a byte count as `"1.21 GiB"`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Formats a speed as `"3.50 MiB/s"`.
pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", format_size(bytes_per_sec.max(0.0) as u64))
}

/// Formats a duration as `"2d 3h"`, `"4h 12m"`, `"5m 9s"`, or `"42s"`.
/// `None` renders as `"-"` (unknown ETA).
pub fn format_eta(eta: Option<Duration>) -> String {
    let Some(eta) = eta else {
        return "-".to_string();
    };
    let secs = eta.as_secs();
    let (d, h, m, s) = (secs / 86_400, secs % 86_400 / 3_600, secs % 3_600 / 60, secs % 60);
    match (d, h, m) {
        (0, 0, 0) => format!("{s}s"),
        (0, 0, _) => format!("{m}m {s}s"),
        (0, _, _) => format!("{h}h {m}m"),
        _ => format!("{d}d {h}h"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KiB");
        assert_eq!(format_size(1_572_864), "1.50 MiB");
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(None), "-");
        assert_eq!(format_eta(Some(Duration::from_secs(42))), "42s");
        assert_eq!(format_eta(Some(Duration::from_secs(309))), "5m 9s");
        assert_eq!(format_eta(Some(Duration::from_secs(15_120))), "4h 12m");
        assert_eq!(format_eta(Some(Duration::from_secs(183_600))), "2d 3h");
    }
}
