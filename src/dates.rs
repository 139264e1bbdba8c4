//! Calendar-day helpers.
//!
//! Every comparison here works on whole days: two moments on the same local
//! calendar date are equal regardless of time-of-day.

use anyhow::{Context, Result};
use chrono::{DateTime, Days, Local, NaiveDate, TimeZone};

pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Calendar day of a timestamp in the local timezone.
pub fn local_day<Tz: TimeZone>(moment: &DateTime<Tz>) -> NaiveDate {
    moment.with_timezone(&Local).date_naive()
}

pub fn is_today(date: NaiveDate, today: NaiveDate) -> bool {
    date == today
}

/// Strictly before `today`. Today itself is never overdue.
pub fn is_overdue(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

/// Whole days `date` lies behind `today`; zero for today or future dates.
pub fn days_past_due(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days().max(0)
}

pub fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    // Only overflows past year 262143.
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT)
        .with_context(|| format!("invalid date '{value}', expected YYYY-MM-DD"))
}

pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Serde adapter for `YYYY-MM-DD` day strings.
pub mod iso_day {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::DAY_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DAY_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // Older records were written with a full timestamp.
        let day = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(day, DAY_FORMAT).map_err(de::Error::custom)
    }
}
