//! Live-feed query selection
//!
//! "Today" is a date-only `YYYY-MM-DD` string in a fixed named zone. The
//! stored `Date of Interview` is compared against it as a string, so both
//! sides must use the same zero-padded layout for ordering to hold.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::store::TaskFilter;

/// `YYYY-MM-DD` for the instant `now` as seen in `tz`
pub fn date_in_zone(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// Today's date in `tz`
pub fn today_in(tz: Tz) -> String {
    date_in_zone(Utc::now(), tz)
}

/// Filter for the validations feed
///
/// A non-empty `date` selects tasks whose `receivedDateTime` contains it
/// (case-insensitive); otherwise the live-feed selector applies.
pub fn validation_filter(date: Option<&str>, today: &str) -> TaskFilter {
    match date.filter(|d| !d.is_empty()) {
        Some(date) => TaskFilter::ReceivedContains(date.to_string()),
        None => TaskFilter::LiveFeed {
            today: today.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_in_zone_uses_local_calendar_day() {
        // 03:30 UTC on Jan 27 is still Jan 26 in New York
        let now = Utc.with_ymd_and_hms(2026, 1, 27, 3, 30, 0).unwrap();
        assert_eq!(date_in_zone(now, chrono_tz::America::New_York), "2026-01-26");
        assert_eq!(date_in_zone(now, chrono_tz::UTC), "2026-01-27");
    }

    #[test]
    fn test_date_is_zero_padded() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(date_in_zone(now, chrono_tz::America::New_York), "2026-03-05");
    }

    #[test]
    fn test_validation_filter_prefers_explicit_date() {
        assert_eq!(
            validation_filter(Some("2026-01-26"), "2026-02-01"),
            TaskFilter::ReceivedContains("2026-01-26".to_string())
        );
    }

    #[test]
    fn test_validation_filter_defaults_to_live_feed() {
        let expected = TaskFilter::LiveFeed {
            today: "2026-02-01".to_string(),
        };
        assert_eq!(validation_filter(None, "2026-02-01"), expected);
        assert_eq!(validation_filter(Some(""), "2026-02-01"), expected);
    }
}
