//! Wall-clock helpers and the timestamped-value pair.
//!
//! All user-facing dates and times are rendered in a fixed UTC+1 offset,
//! matching the time zone the report files are named after. Elapsed-time
//! rendering deliberately rounds each `HH:MM:SS` component independently;
//! see [`duration_to_readable`] before changing anything here.

use std::time::{Duration, Instant};

use chrono::{FixedOffset, Utc};

/// Offset of the reporting time zone, in seconds east of UTC.
const REPORT_ZONE_OFFSET_SECS: i32 = 3600;

fn report_zone() -> FixedOffset {
    FixedOffset::east_opt(REPORT_ZONE_OFFSET_SECS).expect("report zone offset is in range")
}

/// Current date in the reporting zone, formatted `dd.MM.yyyy`.
///
/// Report files are named after this string, and the scheduler compares it
/// between ticks to detect day rollover.
pub fn current_date() -> String {
    Utc::now().with_timezone(&report_zone()).format("%d.%m.%Y").to_string()
}

/// Current time of day in the reporting zone, formatted `HH:mm:ss`.
pub fn current_time() -> String {
    Utc::now().with_timezone(&report_zone()).format("%H:%M:%S").to_string()
}

/// Zero-pad `value` to `width` digits; values that render wider are cut to
/// the leading `width` characters.
fn fit_to_width(value: u64, width: usize) -> String {
    let mut s = value.to_string();
    while s.len() < width {
        s.insert(0, '0');
    }
    s.truncate(width);
    s
}

/// Render an elapsed duration as `HH:MM:SS`.
///
/// Each component is `round(ms / unit_ms)` on its own: the minute field is
/// the total duration in minutes, not the remainder after hours. Together
/// with the width-2 truncation this means the fields are not internally
/// consistent for long durations (45s renders as `00:01:45`, an hour and a
/// half as `01:89:54`-style output). Downstream log parsers match these
/// literals, so the quirk is load-bearing.
pub fn duration_to_readable(elapsed: Duration) -> String {
    let ms = elapsed.as_millis() as f64;

    let hours = (ms / 3_600_000.0).round() as u64;
    let minutes = (ms / 60_000.0).round() as u64;
    let seconds = (ms / 1_000.0).round() as u64;

    format!(
        "{}:{}:{}",
        fit_to_width(hours, 2),
        fit_to_width(minutes, 2),
        fit_to_width(seconds, 2)
    )
}

/// A value paired with the instant it was created.
///
/// Immutable once built; when a tracked value changes, the whole pair is
/// replaced rather than mutated in place.
#[derive(Debug, Clone)]
pub struct Timestamped<T> {
    value: T,
    created_at: Instant,
}

impl<T> Timestamped<T> {
    /// Pair `value` with the current instant.
    pub fn new(value: T) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    /// Time elapsed since this pair was created. Monotonically
    /// non-decreasing for a given instance.
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readable_zero() {
        assert_eq!(duration_to_readable(Duration::ZERO), "00:00:00");
    }

    #[test]
    fn test_readable_plain_seconds() {
        assert_eq!(duration_to_readable(Duration::from_millis(5_000)), "00:00:05");
        assert_eq!(duration_to_readable(Duration::from_millis(29_000)), "00:00:29");
    }

    #[test]
    fn test_readable_rounds_each_unit_independently() {
        // 45s is half of 1.5 minutes, so the minute field rounds up to 01
        // while the second field still reads 45.
        assert_eq!(duration_to_readable(Duration::from_millis(45_000)), "00:01:45");
        // 90s: minutes round(1.5) = 2, seconds 90.
        assert_eq!(duration_to_readable(Duration::from_millis(90_000)), "00:02:90");
    }

    #[test]
    fn test_readable_truncates_wide_components() {
        // 1h28m43s: minutes = round(88.72) = 89, seconds = 5323 cut to "53".
        assert_eq!(
            duration_to_readable(Duration::from_millis(5_323_000)),
            "01:89:53"
        );
        // Exactly one hour: minutes 60, seconds 3600 cut to "36".
        assert_eq!(
            duration_to_readable(Duration::from_millis(3_600_000)),
            "01:60:36"
        );
    }

    #[test]
    fn test_timestamped_elapsed_is_non_decreasing() {
        let stamped = Timestamped::new(42);
        let first = stamped.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert!(stamped.elapsed() >= first);
        assert_eq!(*stamped.value(), 42);
    }

    #[test]
    fn test_date_format_shape() {
        let date = current_date();
        assert_eq!(date.len(), 10);
        assert_eq!(date.matches('.').count(), 2);

        let time = current_time();
        assert_eq!(time.len(), 8);
        assert_eq!(time.matches(':').count(), 2);
    }
}
