//! Date range parsing
//!
//! A date literal never denotes an instant: it denotes the half-open range
//! spanning the smallest unit the user wrote. `2015` covers the whole year,
//! `2015-06-15 10:30` covers one minute. Two input forms are accepted:
//!
//! - lenient ISO-8601 prefixes, `YYYY[-MM[-DD[ |T]HH[:MM[:SS]]]]` with an
//!   optional `Z` or `±HH:MM` zone (UTC when absent);
//! - relative expressions, `N <unit>[s] ago`.
//!
//! The returned pair is `(range_start, range_end)` in epoch seconds, with
//! `range_end` exclusive.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ABSOLUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:[T ](\d{2})(?::(\d{2})(?::(\d{2}))?)?)?)?)?(?:(Z)|([+-])(\d{2}):(\d{2}))?$",
    )
    .expect("absolute date pattern compiles")
});

static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+) (second|minute|hour|day|week|fortnight|month|year)s? ago$")
        .expect("relative date pattern compiles")
});

/// Parse a date literal into its `(range_start, range_end)` span
///
/// `now` anchors relative expressions; it is captured once per compilation
/// so every date literal in a query shares the same origin. Returns `None`
/// when the input matches neither form or names an impossible date.
pub(crate) fn parse_range(input: &str, now: DateTime<Utc>) -> Option<(i64, i64)> {
    let input = input.trim();
    parse_absolute(input).or_else(|| parse_relative(input, now))
}

fn parse_absolute(input: &str) -> Option<(i64, i64)> {
    let caps = ABSOLUTE.captures(input)?;

    let year: i32 = caps[1].parse().ok()?;
    let month = cap_u32(&caps, 2);
    let day = cap_u32(&caps, 3);
    let hour = cap_u32(&caps, 4);
    let minute = cap_u32(&caps, 5);
    let second = cap_u32(&caps, 6);
    let tz = parse_offset(&caps)?;

    let start = instant(
        year,
        month.unwrap_or(1),
        day.unwrap_or(1),
        hour.unwrap_or(0),
        minute.unwrap_or(0),
        second.unwrap_or(0),
        tz,
    )?;

    // Latest instant covered by the literal, then one past it.
    let latest = if second.is_some() {
        start
    } else if let Some(minute) = minute {
        instant(year, month?, day?, hour?, minute, 59, tz)?
    } else if let Some(hour) = hour {
        instant(year, month?, day?, hour, 59, 59, tz)?
    } else if let Some(day) = day {
        instant(year, month?, day, 23, 59, 59, tz)?
    } else if let Some(month) = month {
        instant(year, month, last_day_of_month(year, month)?, 23, 59, 59, tz)?
    } else {
        instant(year, 12, 31, 23, 59, 59, tz)?
    };
    let end = latest.checked_add_signed(Duration::seconds(1))?;

    Some((start.timestamp(), end.timestamp()))
}

fn parse_relative(input: &str, now: DateTime<Utc>) -> Option<(i64, i64)> {
    let caps = RELATIVE.captures(input)?;
    let count: u32 = caps[1].parse().ok()?;
    let unit = &caps[2];

    let higher = sub_units(now, i64::from(count), unit)?;
    let lower = sub_units(higher, 1, unit)?;
    Some((lower.timestamp(), higher.timestamp()))
}

fn sub_units(from: DateTime<Utc>, count: i64, unit: &str) -> Option<DateTime<Utc>> {
    match unit {
        "second" => from.checked_sub_signed(Duration::seconds(count)),
        "minute" => from.checked_sub_signed(Duration::minutes(count)),
        "hour" => from.checked_sub_signed(Duration::hours(count)),
        "day" => from.checked_sub_signed(Duration::days(count)),
        "week" => from.checked_sub_signed(Duration::weeks(count)),
        "fortnight" => from.checked_sub_signed(Duration::weeks(2 * count)),
        // Calendar-aware: same day-of-month, clamped to the target month's
        // length.
        "month" => from.checked_sub_months(Months::new(u32::try_from(count).ok()?)),
        "year" => from.checked_sub_months(Months::new(u32::try_from(count).ok()?.checked_mul(12)?)),
        _ => None,
    }
}

fn instant(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    tz: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    tz.from_local_datetime(&naive).single()
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(first.checked_add_months(Months::new(1))?.pred_opt()?.day())
}

fn parse_offset(caps: &Captures) -> Option<FixedOffset> {
    if caps.get(8).is_some() {
        let hours: i32 = caps[9].parse().ok()?;
        let minutes: i32 = caps[10].parse().ok()?;
        let mut seconds = hours * 3600 + minutes * 60;
        if &caps[8] == "-" {
            seconds = -seconds;
        }
        FixedOffset::east_opt(seconds)
    } else {
        // `Z` or no zone at all: UTC.
        FixedOffset::east_opt(0)
    }
}

fn cap_u32(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> i64 {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
            .unwrap()
            .timestamp()
    }

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_year_span() {
        assert_eq!(
            parse_range("2015", origin()),
            Some((ts(2015, 1, 1, 0, 0, 0), ts(2016, 1, 1, 0, 0, 0)))
        );
    }

    #[test]
    fn test_month_span() {
        assert_eq!(
            parse_range("2015-06", origin()),
            Some((ts(2015, 6, 1, 0, 0, 0), ts(2015, 7, 1, 0, 0, 0)))
        );
    }

    #[test]
    fn test_leap_month_span() {
        assert_eq!(
            parse_range("2016-02", origin()),
            Some((ts(2016, 2, 1, 0, 0, 0), ts(2016, 3, 1, 0, 0, 0)))
        );
    }

    #[test]
    fn test_day_span() {
        assert_eq!(
            parse_range("2015-06-15", origin()),
            Some((ts(2015, 6, 15, 0, 0, 0), ts(2015, 6, 16, 0, 0, 0)))
        );
    }

    #[test]
    fn test_hour_and_minute_spans() {
        assert_eq!(
            parse_range("2015-06-15T10", origin()),
            Some((ts(2015, 6, 15, 10, 0, 0), ts(2015, 6, 15, 11, 0, 0)))
        );
        assert_eq!(
            parse_range("2015-06-15 10:30", origin()),
            Some((ts(2015, 6, 15, 10, 30, 0), ts(2015, 6, 15, 10, 31, 0)))
        );
    }

    #[test]
    fn test_second_span() {
        assert_eq!(
            parse_range("2015-06-15T10:30:07", origin()),
            Some((ts(2015, 6, 15, 10, 30, 7), ts(2015, 6, 15, 10, 30, 8)))
        );
    }

    #[test]
    fn test_explicit_offset() {
        // 2015-01-01 in UTC+01:00 starts an hour before the UTC new year.
        assert_eq!(
            parse_range("2015-01-01T00:00:00+01:00", origin()),
            Some((ts(2014, 12, 31, 23, 0, 0), ts(2014, 12, 31, 23, 0, 1)))
        );
    }

    #[test]
    fn test_zulu_suffix() {
        assert_eq!(
            parse_range("2015Z", origin()),
            Some((ts(2015, 1, 1, 0, 0, 0), ts(2016, 1, 1, 0, 0, 0)))
        );
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(parse_range("2015-13", origin()), None);
        assert_eq!(parse_range("2015-02-30", origin()), None);
        assert_eq!(parse_range("last tuesday", origin()), None);
        assert_eq!(parse_range("", origin()), None);
    }

    #[test]
    fn test_relative_days() {
        let (lower, higher) = parse_range("3 days ago", origin()).unwrap();
        assert_eq!(higher, ts(2025, 3, 28, 12, 0, 0));
        assert_eq!(lower, ts(2025, 3, 27, 12, 0, 0));
    }

    #[test]
    fn test_relative_singular_unit() {
        let (lower, higher) = parse_range("1 second ago", origin()).unwrap();
        assert_eq!(higher, ts(2025, 3, 31, 11, 59, 59));
        assert_eq!(lower, ts(2025, 3, 31, 11, 59, 58));
    }

    #[test]
    fn test_relative_month_clamps_to_month_length() {
        // One month before March 31 lands on February 28.
        let (lower, higher) = parse_range("1 month ago", origin()).unwrap();
        assert_eq!(higher, ts(2025, 2, 28, 12, 0, 0));
        assert_eq!(lower, ts(2025, 1, 28, 12, 0, 0));
    }

    #[test]
    fn test_relative_years() {
        let (lower, higher) = parse_range("2 years ago", origin()).unwrap();
        assert_eq!(higher, ts(2023, 3, 31, 12, 0, 0));
        assert_eq!(lower, ts(2022, 3, 31, 12, 0, 0));
    }

    #[test]
    fn test_fortnight_equals_two_weeks() {
        assert_eq!(
            parse_range("1 fortnight ago", origin()).map(|r| r.1),
            parse_range("2 weeks ago", origin()).map(|r| r.1)
        );
    }
}
