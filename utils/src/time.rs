//! Time formatting helpers.

/// Render how long until a token expires, given the remaining milliseconds.
///
/// Precision drops as the span grows: `42s`, `2m 5s`, `3h 20m`, `2d 5h`.
pub fn format_remaining(millis: u64) -> String {
    let secs = millis / 1000;
    match secs {
        0 if millis == 0 => "expired".to_string(),
        0 => "<1s".to_string(),
        1..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m {}s", secs / 60, secs % 60),
        3600..=86399 => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
        _ => format!("{}d {}h", secs / 86400, (secs % 86400) / 3600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_magnitude() {
        assert_eq!(format_remaining(42_000), "42s");
        assert_eq!(format_remaining(125_000), "2m 5s");
        assert_eq!(format_remaining((3 * 3600 + 20 * 60) * 1000), "3h 20m");
        assert_eq!(format_remaining((2 * 86400 + 5 * 3600) * 1000), "2d 5h");
    }

    #[test]
    fn zero_and_sub_second() {
        assert_eq!(format_remaining(0), "expired");
        assert_eq!(format_remaining(999), "<1s");
    }
}
