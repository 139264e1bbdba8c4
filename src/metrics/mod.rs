//! Study-time figures derived from logged sessions and pomodoro blocks.
//!
//! Study sessions always count in full. Pomodoro blocks only count when they
//! are focus blocks; breaks are never study time.

mod types;

pub use types::{StudySummary, SubjectHours};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{parse_slot_key, revision_topic, same_subject, PomodoroSession, StudySession};

fn counted_minutes<'a>(
    sessions: impl Iterator<Item = &'a StudySession>,
    pomodoros: impl Iterator<Item = &'a PomodoroSession>,
) -> u64 {
    let study: u64 = sessions.map(|session| u64::from(session.duration)).sum();
    let focus: u64 = pomodoros
        .filter(|block| block.session_type.is_focus())
        .map(|block| u64::from(block.duration))
        .sum();
    study + focus
}

pub fn hours_studied_today(
    sessions: &[StudySession],
    pomodoros: &[PomodoroSession],
    today: NaiveDate,
) -> f64 {
    let minutes = counted_minutes(
        sessions.iter().filter(|session| session.date == today),
        pomodoros.iter().filter(|block| block.date == today),
    );
    minutes as f64 / 60.0
}

pub fn total_hours_studied(sessions: &[StudySession], pomodoros: &[PomodoroSession]) -> f64 {
    counted_minutes(sessions.iter(), pomodoros.iter()) as f64 / 60.0
}

/// Hours per subject, most studied first. Subjects group case-insensitively
/// under the first spelling seen.
pub fn hours_by_subject(sessions: &[StudySession], pomodoros: &[PomodoroSession]) -> Vec<SubjectHours> {
    let mut totals: Vec<(String, u64)> = Vec::new();
    let mut add = |subject: &str, minutes: u32| {
        match totals.iter_mut().find(|(name, _)| same_subject(name, subject)) {
            Some((_, total)) => *total += u64::from(minutes),
            None => totals.push((subject.trim().to_string(), u64::from(minutes))),
        }
    };

    for session in sessions {
        add(&session.subject, session.duration);
    }
    for block in pomodoros.iter().filter(|block| block.session_type.is_focus()) {
        add(&block.subject, block.duration);
    }

    let mut hours: Vec<SubjectHours> = totals
        .into_iter()
        .map(|(subject, minutes)| SubjectHours {
            subject,
            hours: minutes as f64 / 60.0,
        })
        .collect();
    hours.sort_by(|a, b| b.hours.total_cmp(&a.hours));
    hours
}

/// Whole days left until the exam, rounded up. Zero when no exam is set.
pub fn days_until_exam(exam_date: Option<NaiveDate>, now: NaiveDateTime) -> i64 {
    let Some(exam) = exam_date else {
        return 0;
    };
    let hours = (exam.and_time(NaiveTime::MIN) - now).num_hours();
    (hours as f64 / 24.0).ceil() as i64
}

/// Slot number a pomodoro topic refers to, for topics such as
/// `"Limits (Revision 2)"`. `Some(None)` means a revision without a number.
fn revision_reference(block_topic: &str, topic: &str) -> Option<Option<usize>> {
    let block_topic = block_topic.to_lowercase();
    let topic = topic.to_lowercase();
    if !block_topic.contains(&topic) {
        return None;
    }

    let marker = "(revision";
    let start = block_topic.find(marker)? + marker.len();
    let rest = block_topic[start..].trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return rest.starts_with(')').then_some(None);
    }
    let index = digits.parse::<usize>().ok()?.checked_sub(1)?;
    Some(Some(index))
}

fn revision_blocks<'a>(
    subject: &'a str,
    topic: &'a str,
    pomodoros: &'a [PomodoroSession],
) -> impl Iterator<Item = (Option<usize>, u32)> + 'a {
    pomodoros
        .iter()
        .filter(|block| block.session_type.is_focus())
        .filter(move |block| same_subject(&block.subject, subject))
        .filter_map(move |block| {
            revision_reference(&block.topic, topic).map(|slot| (slot, block.duration))
        })
}

/// Focus minutes spent on one revision slot of `subject`/`topic`.
///
/// Only blocks whose topic is exactly `"<topic> (Revision N)"` count, compared
/// case-insensitively, where `N` is the slot number of `slot_key`.
pub fn revision_time_spent(
    subject: &str,
    topic: &str,
    slot_key: &str,
    pomodoros: &[PomodoroSession],
) -> u32 {
    let Some(index) = parse_slot_key(slot_key) else {
        return 0;
    };
    let wanted = revision_topic(topic, index + 1).to_lowercase();

    pomodoros
        .iter()
        .filter(|block| block.session_type.is_focus())
        .filter(|block| same_subject(&block.subject, subject))
        .filter(|block| block.topic.trim().to_lowercase() == wanted)
        .map(|block| block.duration)
        .sum()
}

/// Focus minutes per slot for the first `slots` revisions, for a breakdown
/// across the whole session. Looser than [`revision_time_spent`]: any block
/// mentioning the topic and a revision counts, and blocks tagged as a
/// revision without a number are counted towards the first slot.
pub fn revision_time_by_slot(
    subject: &str,
    topic: &str,
    pomodoros: &[PomodoroSession],
    slots: usize,
) -> Vec<u32> {
    let mut minutes = vec![0; slots];
    for (slot, duration) in revision_blocks(subject, topic, pomodoros) {
        if let Some(total) = minutes.get_mut(slot.unwrap_or(0)) {
            *total += duration;
        }
    }
    minutes
}

/// `""`, `"45m"`, `"2h"` or `"1h 30m"`.
pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, 0) => String::new(),
        (0, rest) => format!("{rest}m"),
        (hours, 0) => format!("{hours}h"),
        (hours, rest) => format!("{hours}h {rest}m"),
    }
}

pub fn study_summary(
    sessions: &[StudySession],
    pomodoros: &[PomodoroSession],
    daily_target_hours: f64,
    exam_date: Option<NaiveDate>,
    now: NaiveDateTime,
) -> StudySummary {
    StudySummary {
        hours_today: hours_studied_today(sessions, pomodoros, now.date()),
        total_hours: total_hours_studied(sessions, pomodoros),
        daily_target_hours,
        days_until_exam: days_until_exam(exam_date, now),
        by_subject: hours_by_subject(sessions, pomodoros),
    }
}
