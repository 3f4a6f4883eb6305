// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Human-readable formatting of activity numbers.

use chrono::{DateTime, Utc};

/// Meters to `"12.3 km"`.
pub fn format_distance(meters: f64) -> String {
    format!("{:.1} km", meters / 1000.0)
}

/// Seconds to `"1h 5m"`, or `"42m"` under an hour.
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Meters per second to `"31.4 km/h"`.
pub fn format_speed(meters_per_second: f64) -> String {
    format!("{:.1} km/h", meters_per_second * 3.6)
}

/// Pace from average speed: `m:ss/100m` for swims, `m:ss/km` otherwise.
///
/// Returns `None` for a stationary activity.
pub fn format_pace(meters_per_second: f64, activity_type: &str) -> Option<String> {
    if !meters_per_second.is_finite() || meters_per_second <= 0.0 {
        return None;
    }

    let (unit_meters, suffix) = if activity_type == "Swim" {
        (100.0, "/100m")
    } else {
        (1000.0, "/km")
    };

    let total_seconds = (unit_meters / meters_per_second).round() as u64;
    Some(format!(
        "{}:{:02}{}",
        total_seconds / 60,
        total_seconds % 60,
        suffix
    ))
}

/// Long calendar date, e.g. `"October 18, 2026"`.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Distance between `then` and `now` in words, with a suffix:
/// `"less than a minute ago"`, `"about 2 hours ago"`, `"in 3 days"`.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let in_future = delta.num_seconds() < 0;
    let words = distance_in_words(delta.num_seconds().unsigned_abs());

    if in_future {
        format!("in {}", words)
    } else {
        format!("{} ago", words)
    }
}

const MINUTES_IN_DAY: f64 = 1440.0;
const MINUTES_IN_MONTH: f64 = 43200.0;
const MINUTES_IN_TWO_MONTHS: f64 = 86400.0;

fn distance_in_words(seconds: u64) -> String {
    let minutes = (seconds as f64 / 60.0).round();

    if minutes < 1.0 {
        return "less than a minute".to_string();
    }
    if minutes < 2.0 {
        return "1 minute".to_string();
    }
    if minutes < 45.0 {
        return format!("{} minutes", minutes as u64);
    }
    if minutes < 90.0 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = (minutes / 60.0).round() as u64;
        return format!("about {} hours", hours);
    }
    if minutes < 2520.0 {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        let days = (minutes / MINUTES_IN_DAY).round() as u64;
        return format!("{} days", days);
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        let months = (minutes / MINUTES_IN_MONTH).round() as u64;
        return format!("about {} month{}", months, if months == 1 { "" } else { "s" });
    }

    let months = (minutes / MINUTES_IN_MONTH).floor() as u64;
    if months < 12 {
        return format!("{} months", months);
    }

    let years = months / 12;
    let remainder = months % 12;
    if remainder < 3 {
        format!("about {} year{}", years, if years == 1 { "" } else { "s" })
    } else if remainder < 9 {
        format!("over {} year{}", years, if years == 1 { "" } else { "s" })
    } else {
        format!("almost {} years", years + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0.0 km");
        assert_eq!(format_distance(42195.0), "42.2 km");
        assert_eq!(format_distance(1234.0), "1.2 km");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(59), "0m");
        assert_eq!(format_time(2520), "42m");
        assert_eq!(format_time(3600), "1h 0m");
        assert_eq!(format_time(3900), "1h 5m");
        assert_eq!(format_time(36000 + 59 * 60 + 59), "10h 59m");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(10.0), "36.0 km/h");
        assert_eq!(format_speed(8.72), "31.4 km/h");
    }

    #[test]
    fn test_format_pace_run() {
        // 5:00/km
        assert_eq!(format_pace(1000.0 / 300.0, "Run").unwrap(), "5:00/km");
        // 4:10/km
        assert_eq!(format_pace(4.0, "Run").unwrap(), "4:10/km");
    }

    #[test]
    fn test_format_pace_swim_uses_100m() {
        // 100m in 2:00
        assert_eq!(format_pace(100.0 / 120.0, "Swim").unwrap(), "2:00/100m");
    }

    #[test]
    fn test_format_pace_carries_rounded_seconds() {
        // 299.7s per km must not render as 4:60
        assert_eq!(format_pace(1000.0 / 299.7, "Run").unwrap(), "5:00/km");
    }

    #[test]
    fn test_format_pace_stationary() {
        assert_eq!(format_pace(0.0, "Run"), None);
        assert_eq!(format_pace(f64::NAN, "Run"), None);
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2026, 10, 8, 7, 0, 0).unwrap();
        assert_eq!(format_date(date), "October 8, 2026");
    }

    #[test]
    fn test_format_relative() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();

        assert_eq!(
            format_relative(now - Duration::seconds(10), now),
            "less than a minute ago"
        );
        assert_eq!(format_relative(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(format_relative(now - Duration::minutes(60), now), "about 1 hour ago");
        assert_eq!(format_relative(now - Duration::hours(2), now), "about 2 hours ago");
        assert_eq!(format_relative(now - Duration::hours(30), now), "1 day ago");
        assert_eq!(format_relative(now - Duration::days(3), now), "3 days ago");
        assert_eq!(format_relative(now - Duration::days(35), now), "about 1 month ago");
        assert_eq!(format_relative(now - Duration::days(100), now), "3 months ago");
        assert_eq!(format_relative(now - Duration::days(400), now), "about 1 year ago");
        assert_eq!(format_relative(now + Duration::days(3), now), "in 3 days");
    }
}
