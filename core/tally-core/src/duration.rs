//! Human-readable duration formatting.

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Formats a nanosecond duration as `[Nd][Nh][Nm]Ns`.
///
/// Decomposes by truncating integer division; leading zero units are
/// omitted, seconds are always present. `format(0)` is `"0s"`.
pub fn format(ns: u64) -> String {
    let mut x = ns / NANOS_PER_SEC;
    let s = x % 60;
    x /= 60;
    let m = x % 60;
    x /= 60;
    let h = x % 24;
    let d = x / 24;

    let mut out = String::new();
    if d > 0 {
        out.push_str(&format!("{d}d"));
    }
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    out.push_str(&format!("{s}s"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_seconds_only() {
        assert_eq!(format(0), "0s");
    }

    #[test]
    fn sub_second_truncates_to_zero() {
        assert_eq!(format(999_999_999), "0s");
    }

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(format(61 * NANOS_PER_SEC), "1m1s");
    }

    #[test]
    fn hours_minutes_seconds() {
        assert_eq!(format((3600 + 120 + 3) * NANOS_PER_SEC), "1h2m3s");
    }

    #[test]
    fn day_component_appears() {
        // 90,000 seconds is 1d1h0m0s; leading units present, zero middle
        // units omitted, trailing seconds kept.
        assert_eq!(format(90_000_000_000_000), "1d1h0s");
    }

    #[test]
    fn exact_minute_keeps_zero_seconds() {
        assert_eq!(format(60 * NANOS_PER_SEC), "1m0s");
    }
}
