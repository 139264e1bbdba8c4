use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::dates::{days_past_due, format_day};
use crate::models::{parse_slot_key, StudySession};
use crate::revisions::status::{resolve_status, RevisionStatus};

/// One outstanding revision of an active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionItem {
    pub session_id: String,
    pub subject: String,
    pub topic: String,
    pub revision_key: String,
    pub revision_date: NaiveDate,
    pub status: RevisionStatus,
    pub days_past_due: i64,
}

fn outstanding(sessions: &[StudySession], today: NaiveDate, wanted: RevisionStatus) -> Vec<RevisionItem> {
    sessions
        .iter()
        .filter(|session| !session.is_completed)
        .flat_map(|session| {
            session.revisions.entries().filter_map(move |(key, record)| {
                let status = resolve_status(record, today);
                (status == wanted).then(|| RevisionItem {
                    session_id: session.id.clone(),
                    subject: session.subject.clone(),
                    topic: session.topic.clone(),
                    revision_key: key,
                    revision_date: record.date,
                    status,
                    days_past_due: days_past_due(record.date, today),
                })
            })
        })
        .collect()
}

/// Revisions falling due today. Completed sessions are skipped.
pub fn revisions_due(sessions: &[StudySession], today: NaiveDate) -> Vec<RevisionItem> {
    outstanding(sessions, today, RevisionStatus::Due)
}

/// Missed revisions, most overdue first. Completed sessions are skipped.
pub fn overdue_revisions(sessions: &[StudySession], today: NaiveDate) -> Vec<RevisionItem> {
    let mut items = outstanding(sessions, today, RevisionStatus::Overdue);
    items.sort_by(|a, b| b.days_past_due.cmp(&a.days_past_due));
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevisionProgress {
    pub total: usize,
    pub completed: usize,
    pub percentage: f64,
}

/// Slot completion across every session, completed ones included.
pub fn revision_progress(sessions: &[StudySession]) -> RevisionProgress {
    let (total, completed) = sessions.iter().fold((0, 0), |(total, completed), session| {
        (
            total + session.revisions.len(),
            completed + session.revisions.completed_count(),
        )
    });

    let percentage = if total > 0 {
        completed as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    RevisionProgress {
        total,
        completed,
        percentage,
    }
}

/// Short label such as `Rev 2 (3d)`.
pub fn revision_label(slot_key: &str, intervals: &[u32]) -> Option<String> {
    let index = parse_slot_key(slot_key)?;
    let days = intervals.get(index).or_else(|| intervals.last())?;
    Some(format!("Rev {} ({}d)", index + 1, days))
}

/// Completed sessions matching `search` in subject or topic (case-insensitive),
/// most recently completed first. Sessions without a completion time sort by
/// their study date.
pub fn completed_sessions<'a>(sessions: &'a [StudySession], search: &str) -> Vec<&'a StudySession> {
    let needle = search.trim().to_lowercase();
    let mut matches: Vec<&StudySession> = sessions
        .iter()
        .filter(|session| session.is_completed)
        .filter(|session| {
            needle.is_empty()
                || session.subject.to_lowercase().contains(&needle)
                || session.topic.to_lowercase().contains(&needle)
        })
        .collect();

    matches.sort_by_key(|session| {
        std::cmp::Reverse(
            session
                .completed_at
                .map(|at| at.naive_utc())
                .unwrap_or_else(|| session.date.and_time(NaiveTime::MIN)),
        )
    });
    matches
}

/// Sessions grouped by study day, newest day first.
pub fn sessions_by_date(sessions: &[StudySession]) -> Vec<(String, Vec<&StudySession>)> {
    let mut groups: BTreeMap<NaiveDate, Vec<&StudySession>> = BTreeMap::new();
    for session in sessions {
        groups.entry(session.date).or_default().push(session);
    }
    groups
        .into_iter()
        .rev()
        .map(|(date, group)| (format_day(date), group))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_day;
    use crate::models::{RevisionRecord, RevisionSlots, SessionKind};
    use chrono::{TimeZone, Utc};

    fn day(value: &str) -> NaiveDate {
        parse_day(value).unwrap()
    }

    fn session(id: &str, date: &str, slots: &[(&str, bool)]) -> StudySession {
        StudySession {
            id: id.into(),
            date: day(date),
            subject: "Biology".into(),
            topic: format!("Topic {id}"),
            duration: 30,
            kind: SessionKind::Study,
            revisions: slots
                .iter()
                .map(|(date, completed)| RevisionRecord {
                    date: day(date),
                    completed: *completed,
                })
                .collect::<RevisionSlots>(),
            is_completed: false,
            completed_at: None,
        }
    }

    #[test]
    fn due_lists_only_todays_incomplete_slots() {
        let today = day("2024-02-10");
        let sessions = vec![
            session("a", "2024-02-09", &[("2024-02-10", false), ("2024-02-12", false)]),
            session("b", "2024-02-07", &[("2024-02-10", true), ("2024-02-08", false)]),
        ];

        let due = revisions_due(&sessions, today);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].session_id, "a");
        assert_eq!(due[0].revision_key, "revision1");
    }

    #[test]
    fn overdue_sorted_most_late_first_and_skips_completed_sessions() {
        let today = day("2024-02-10");
        let mut finished = session("c", "2024-01-01", &[("2024-01-02", false)]);
        finished.is_completed = true;

        let sessions = vec![
            session("a", "2024-02-07", &[("2024-02-08", false)]),
            session("b", "2024-01-30", &[("2024-01-31", false), ("2024-02-02", true)]),
            finished,
        ];

        let overdue = overdue_revisions(&sessions, today);
        let ids: Vec<(&str, i64)> = overdue
            .iter()
            .map(|item| (item.session_id.as_str(), item.days_past_due))
            .collect();
        assert_eq!(ids, vec![("b", 10), ("a", 2)]);
    }

    #[test]
    fn progress_counts_every_slot() {
        let sessions = vec![
            session("a", "2024-02-07", &[("2024-02-08", true), ("2024-02-10", false)]),
            session("b", "2024-02-07", &[("2024-02-08", true), ("2024-02-10", true)]),
        ];
        let progress = revision_progress(&sessions);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.completed, 3);
        assert!((progress.percentage - 75.0).abs() < f64::EPSILON);

        assert_eq!(revision_progress(&[]).percentage, 0.0);
    }

    #[test]
    fn labels_use_slot_interval() {
        assert_eq!(revision_label("revision2", &[1, 3, 7]).as_deref(), Some("Rev 2 (3d)"));
        assert_eq!(revision_label("revision5", &[1, 3, 7]).as_deref(), Some("Rev 5 (7d)"));
        assert_eq!(revision_label("nope", &[1]), None);
    }

    #[test]
    fn completed_sessions_search_and_order() {
        let mut older = session("a", "2024-01-01", &[("2024-01-02", true)]);
        older.is_completed = true;
        older.completed_at = Some(Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap());

        let mut newer = session("b", "2024-01-02", &[("2024-01-03", true)]);
        newer.is_completed = true;
        newer.completed_at = Some(Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap());

        let active = session("c", "2024-01-03", &[("2024-01-04", false)]);
        let sessions = vec![older, newer, active];

        let all: Vec<&str> = completed_sessions(&sessions, "")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(all, vec!["b", "a"]);

        let found: Vec<&str> = completed_sessions(&sessions, "topic A")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(found, vec!["a"]);
    }

    #[test]
    fn groups_newest_day_first() {
        let sessions = vec![
            session("a", "2024-01-01", &[]),
            session("b", "2024-01-03", &[]),
            session("c", "2024-01-01", &[]),
        ];
        let groups = sessions_by_date(&sessions);
        assert_eq!(groups[0].0, "2024-01-03");
        assert_eq!(groups[1].1.len(), 2);
    }
}
