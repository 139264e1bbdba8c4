use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::{iso_day, local_day};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PomodoroKind {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl PomodoroKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PomodoroKind::Pomodoro => "pomodoro",
            PomodoroKind::ShortBreak => "short-break",
            PomodoroKind::LongBreak => "long-break",
        }
    }

    pub fn is_focus(&self) -> bool {
        matches!(self, PomodoroKind::Pomodoro)
    }
}

/// A finished timer block recorded by the pomodoro collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    pub id: String,
    #[serde(with = "iso_day")]
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Minutes.
    pub duration: u32,
    pub session_type: PomodoroKind,
    pub subject: String,
    pub topic: String,
}

impl PomodoroSession {
    /// A block of `minutes` that ended at `end_time`.
    pub fn finished(
        session_type: PomodoroKind,
        subject: &str,
        topic: &str,
        minutes: u32,
        end_time: DateTime<Utc>,
    ) -> Self {
        let start_time = end_time - Duration::minutes(i64::from(minutes));
        Self {
            id: Uuid::new_v4().to_string(),
            date: local_day(&start_time),
            start_time,
            end_time,
            duration: minutes,
            session_type,
            subject: subject.trim().to_string(),
            topic: topic.trim().to_string(),
        }
    }
}

/// Topic under which a focus block on revision `number` of `topic` is logged,
/// e.g. `"Limits (Revision 2)"`.
pub fn revision_topic(topic: &str, number: usize) -> String {
    format!("{} (Revision {number})", topic.trim())
}
