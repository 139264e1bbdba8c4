use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::dates::{format_day, parse_day};
use crate::models::{PomodoroKind, SessionKind};

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} out of range: {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    parse_day(value).with_context(|| format!("failed to parse {field}"))
}

pub fn date_to_sql(date: NaiveDate) -> String {
    format_day(date)
}

pub fn parse_session_kind(value: &str) -> Result<SessionKind> {
    match value {
        "study" => Ok(SessionKind::Study),
        "pomodoro" => Ok(SessionKind::Pomodoro),
        other => Err(anyhow!("unknown session kind {other}")),
    }
}

pub fn parse_pomodoro_kind(value: &str) -> Result<PomodoroKind> {
    match value {
        "pomodoro" => Ok(PomodoroKind::Pomodoro),
        "short-break" => Ok(PomodoroKind::ShortBreak),
        "long-break" => Ok(PomodoroKind::LongBreak),
        other => Err(anyhow!("unknown pomodoro session type {other}")),
    }
}
