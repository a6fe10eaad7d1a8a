use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::models::task::WeekdayCode;

/// The calendar date in the organization's zone at instant `now`.
pub fn org_today(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Weekday in the app's Mon=0..Sun=6 convention.
pub fn app_weekday(date: NaiveDate) -> WeekdayCode {
    date.weekday().num_days_from_monday() as WeekdayCode
}

/// Parses a `YYYY-MM-DD` date, ignoring any time portion that follows it.
pub fn calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Whole calendar days from `from` to `to`, midnight to midnight.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
