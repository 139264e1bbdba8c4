//! Rebuilding revision slots after the revision settings change.
//!
//! Slot `i` keeps its completion flag across a settings change while its due
//! date is recomputed from the new interval. Slots added by a longer schedule
//! start incomplete. Slots removed by a shorter schedule are dropped together
//! with their completion history; that loss is accepted and cannot be undone
//! by growing the schedule again.
//!
//! Reconciliation never touches `is_completed`/`completed_at`. Callers run
//! [`reevaluate_lifecycle`](super::lifecycle::reevaluate_lifecycle) afterwards.

use crate::models::{RevisionRecord, RevisionSlots, StudySession};
use crate::revisions::{
    config::{RevisionSettings, SettingsError},
    schedule::due_date,
};

/// Slots of one session rebuilt against `settings`.
pub fn reconcile_slots(
    session: &StudySession,
    settings: &RevisionSettings,
) -> Result<RevisionSlots, SettingsError> {
    settings.validate()?;

    (0..settings.number_of_revisions)
        .map(|index| {
            let completed = session
                .revisions
                .get(index)
                .map(|existing| existing.completed)
                .unwrap_or(false);
            Ok(RevisionRecord {
                date: due_date(session.date, settings, index)?,
                completed,
            })
        })
        .collect::<Result<Vec<_>, SettingsError>>()
        .map(RevisionSlots::new)
}

pub fn reconcile_session(
    session: &StudySession,
    settings: &RevisionSettings,
) -> Result<StudySession, SettingsError> {
    Ok(StudySession {
        revisions: reconcile_slots(session, settings)?,
        ..session.clone()
    })
}

/// Every session rebuilt against `settings`, as a new collection.
///
/// Invalid settings are rejected before any session is rebuilt. Applying the
/// same settings twice gives the same result as applying them once.
pub fn reconcile(
    sessions: &[StudySession],
    settings: &RevisionSettings,
) -> Result<Vec<StudySession>, SettingsError> {
    settings.validate()?;
    sessions
        .iter()
        .map(|session| reconcile_session(session, settings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_day;
    use crate::models::SessionKind;
    use crate::revisions::schedule::generate_schedule;
    use chrono::NaiveDate;

    fn day(value: &str) -> NaiveDate {
        parse_day(value).unwrap()
    }

    fn session_with(settings: &RevisionSettings, completed: &[usize]) -> StudySession {
        let mut revisions = generate_schedule(day("2024-01-01"), settings).unwrap();
        for index in completed {
            revisions.get_mut(*index).unwrap().completed = true;
        }
        StudySession {
            id: "s1".into(),
            date: day("2024-01-01"),
            subject: "Math".into(),
            topic: "Series".into(),
            duration: 60,
            kind: SessionKind::Study,
            revisions,
            is_completed: false,
            completed_at: None,
        }
    }

    #[test]
    fn growing_keeps_completions_and_adds_incomplete_slots() {
        let before = session_with(&RevisionSettings::default(), &[0, 1, 2, 3]);
        let grown = RevisionSettings::new(6, vec![1, 3, 7, 14, 24, 39]).unwrap();

        let after = reconcile_session(&before, &grown).unwrap();

        assert_eq!(after.revisions.len(), 6);
        assert_eq!(after.revisions.completed_count(), 4);
        assert_eq!(after.revisions.by_key("revision5"), Some(&RevisionRecord::pending(day("2024-01-25"))));
        assert_eq!(after.revisions.by_key("revision6"), Some(&RevisionRecord::pending(day("2024-02-09"))));
    }

    #[test]
    fn shrinking_drops_trailing_slots() {
        let six = RevisionSettings::with_optional(2).unwrap();
        let before = session_with(&six, &[4]);

        let after = reconcile_session(&before, &RevisionSettings::default()).unwrap();

        assert_eq!(after.revisions.len(), 4);
        assert!(after.revisions.by_key("revision5").is_none());
        assert_eq!(after.revisions.completed_count(), 0);
    }

    #[test]
    fn due_dates_follow_new_intervals_but_completion_sticks() {
        let before = session_with(&RevisionSettings::default(), &[1]);
        let stretched = RevisionSettings::new(4, vec![2, 5, 10, 20]).unwrap();

        let after = reconcile_session(&before, &stretched).unwrap();

        let second = after.revisions.get(1).unwrap();
        assert_eq!(second.date, day("2024-01-06"));
        assert!(second.completed);
        assert_eq!(after.revisions.get(3).unwrap().date, day("2024-01-21"));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let sessions = vec![
            session_with(&RevisionSettings::default(), &[0, 2]),
            session_with(&RevisionSettings::with_optional(3).unwrap(), &[5, 6]),
        ];
        let target = RevisionSettings::new(5, vec![1, 2, 4]).unwrap();

        let once = reconcile(&sessions, &target).unwrap();
        let twice = reconcile(&once, &target).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn lifecycle_fields_are_left_alone() {
        let mut before = session_with(&RevisionSettings::default(), &[0, 1, 2, 3]);
        before.is_completed = true;

        let grown = RevisionSettings::with_optional(1).unwrap();
        let after = reconcile_session(&before, &grown).unwrap();
        assert!(after.is_completed);
    }

    #[test]
    fn invalid_settings_leave_sessions_untouched() {
        let sessions = vec![session_with(&RevisionSettings::default(), &[0])];
        let broken = RevisionSettings {
            number_of_revisions: 3,
            intervals: Vec::new(),
        };
        assert_eq!(reconcile(&sessions, &broken).unwrap_err(), SettingsError::NoIntervals);
        assert_eq!(sessions[0].revisions.completed_count(), 1);
    }
}
