use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{is_overdue, is_today};
use crate::models::RevisionRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RevisionStatus {
    Completed,
    Due,
    Overdue,
    Pending,
}

impl RevisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionStatus::Completed => "completed",
            RevisionStatus::Due => "due",
            RevisionStatus::Overdue => "overdue",
            RevisionStatus::Pending => "pending",
        }
    }
}

/// Display state of a revision on `today`. Completion wins over any date.
pub fn resolve_status(record: &RevisionRecord, today: NaiveDate) -> RevisionStatus {
    if record.completed {
        RevisionStatus::Completed
    } else if is_today(record.date, today) {
        RevisionStatus::Due
    } else if is_overdue(record.date, today) {
        RevisionStatus::Overdue
    } else {
        RevisionStatus::Pending
    }
}

/// [`resolve_status`] against the local system date.
pub fn resolve_status_now(record: &RevisionRecord) -> RevisionStatus {
    resolve_status(record, crate::dates::today())
}
