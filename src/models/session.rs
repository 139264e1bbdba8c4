use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::revision::RevisionSlots;
use crate::dates::iso_day;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    #[default]
    Study,
    Pomodoro,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Study => "study",
            SessionKind::Pomodoro => "pomodoro",
        }
    }
}

/// One logged study session and its revision schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    #[serde(with = "iso_day")]
    pub date: NaiveDate,
    pub subject: String,
    pub topic: String,
    /// Minutes studied.
    pub duration: u32,
    #[serde(rename = "type", default)]
    pub kind: SessionKind,
    pub revisions: RevisionSlots,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StudySession {
    pub fn all_revisions_complete(&self) -> bool {
        self.revisions.all_completed()
    }
}

/// Fields a caller supplies when logging or editing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
    #[serde(with = "iso_day")]
    pub date: NaiveDate,
    pub subject: String,
    pub topic: String,
    pub duration: u32,
}
