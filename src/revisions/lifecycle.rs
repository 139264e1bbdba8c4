use chrono::{DateTime, Utc};

use crate::models::{parse_slot_key, StudySession};

/// Session state derived from its revision slots alone.
///
/// Completing every slot stamps `completed_at = now`. Losing completeness
/// (a reconciliation added an incomplete slot) clears the stamp but leaves
/// every slot flag as it was. Sessions already in the right state are
/// returned unchanged, so the original completion time survives re-runs.
pub fn reevaluate_session(session: &StudySession, now: DateTime<Utc>) -> StudySession {
    let all_complete = session.all_revisions_complete();

    match (session.is_completed, all_complete) {
        (false, true) => StudySession {
            is_completed: true,
            completed_at: Some(now),
            ..session.clone()
        },
        (true, false) => StudySession {
            is_completed: false,
            completed_at: None,
            ..session.clone()
        },
        _ => session.clone(),
    }
}

/// [`reevaluate_session`] over the whole collection. Idempotent.
pub fn reevaluate_lifecycle(sessions: &[StudySession], now: DateTime<Utc>) -> Vec<StudySession> {
    sessions
        .iter()
        .map(|session| reevaluate_session(session, now))
        .collect()
}

/// Ids whose state differs between two passes over the same sessions.
pub fn state_changes<'a>(before: &'a [StudySession], after: &'a [StudySession]) -> Vec<&'a str> {
    before
        .iter()
        .zip(after)
        .filter(|(old, new)| old.is_completed != new.is_completed)
        .map(|(old, _)| old.id.as_str())
        .collect()
}

/// Every slot back to incomplete and the session back to active.
pub fn restore_session(session: &StudySession) -> StudySession {
    let mut restored = session.clone();
    for record in restored.revisions.iter_mut() {
        record.completed = false;
    }
    restored.is_completed = false;
    restored.completed_at = None;
    restored
}

/// Flip the completion flag of one slot.
///
/// An unknown or malformed key returns the session unchanged; the slot may
/// have just been removed by a reconciliation. Callers re-run
/// [`reevaluate_lifecycle`] afterwards.
pub fn toggle_revision(session: &StudySession, slot_key: &str) -> StudySession {
    let mut toggled = session.clone();
    if let Some(record) = parse_slot_key(slot_key).and_then(|index| toggled.revisions.get_mut(index)) {
        record.completed = !record.completed;
    }
    toggled
}

/// Apply `f` to the session with `id`, leaving every other session as is.
/// A missing id returns the collection unchanged.
pub fn update_by_id<F>(sessions: &[StudySession], id: &str, f: F) -> Vec<StudySession>
where
    F: Fn(&StudySession) -> StudySession,
{
    sessions
        .iter()
        .map(|session| {
            if session.id == id {
                f(session)
            } else {
                session.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_day;
    use crate::models::SessionKind;
    use crate::revisions::{config::RevisionSettings, schedule::generate_schedule};
    use chrono::TimeZone;

    fn session(id: &str) -> StudySession {
        let date = parse_day("2024-01-01").unwrap();
        StudySession {
            id: id.into(),
            date,
            subject: "History".into(),
            topic: "Tudors".into(),
            duration: 45,
            kind: SessionKind::Study,
            revisions: generate_schedule(date, &RevisionSettings::default()).unwrap(),
            is_completed: false,
            completed_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap()
    }

    fn complete_all(session: &StudySession) -> StudySession {
        (1..=session.revisions.len()).fold(session.clone(), |acc, n| {
            toggle_revision(&acc, &format!("revision{n}"))
        })
    }

    #[test]
    fn new_session_is_active() {
        let fresh = reevaluate_session(&session("a"), now());
        assert!(!fresh.is_completed);
        assert!(fresh.completed_at.is_none());
    }

    #[test]
    fn completing_every_slot_completes_the_session() {
        let done = reevaluate_session(&complete_all(&session("a")), now());
        assert!(done.is_completed);
        assert_eq!(done.completed_at, Some(now()));
    }

    #[test]
    fn re_running_keeps_the_first_completion_time() {
        let done = reevaluate_session(&complete_all(&session("a")), now());
        let later = now() + chrono::Duration::days(3);
        assert_eq!(reevaluate_session(&done, later).completed_at, Some(now()));
    }

    #[test]
    fn incomplete_slot_reverts_without_touching_flags() {
        let mut done = reevaluate_session(&complete_all(&session("a")), now());
        done.revisions = {
            let mut slots: Vec<_> = done.revisions.iter().copied().collect();
            slots.push(crate::models::RevisionRecord::pending(parse_day("2024-01-25").unwrap()));
            slots.into_iter().collect()
        };

        let reverted = reevaluate_session(&done, now());
        assert!(!reverted.is_completed);
        assert!(reverted.completed_at.is_none());
        assert_eq!(reverted.revisions.completed_count(), 4);
        assert_eq!(reverted.revisions, done.revisions);
    }

    #[test]
    fn toggle_unknown_slot_is_a_no_op() {
        let original = session("a");
        assert_eq!(toggle_revision(&original, "revision9"), original);
        assert_eq!(toggle_revision(&original, "bogus"), original);
    }

    #[test]
    fn toggle_twice_restores_the_flag() {
        let original = session("a");
        let once = toggle_revision(&original, "revision2");
        assert!(once.revisions.get(1).unwrap().completed);
        assert_eq!(toggle_revision(&once, "revision2"), original);
    }

    #[test]
    fn restore_clears_everything() {
        let done = reevaluate_session(&complete_all(&session("a")), now());
        let restored = restore_session(&done);

        assert!(restored.revisions.iter().all(|r| !r.completed));
        assert!(!restored.is_completed);
        assert!(restored.completed_at.is_none());
        assert_eq!(restored.revisions.len(), done.revisions.len());
    }

    #[test]
    fn lifecycle_pass_is_idempotent_and_reports_changes() {
        let sessions = vec![complete_all(&session("a")), session("b")];
        let once = reevaluate_lifecycle(&sessions, now());
        let twice = reevaluate_lifecycle(&once, now());

        assert_eq!(once, twice);
        assert_eq!(state_changes(&sessions, &once), vec!["a"]);
        assert!(state_changes(&once, &twice).is_empty());
    }

    #[test]
    fn update_by_id_ignores_missing_ids() {
        let sessions = vec![session("a"), session("b")];
        assert_eq!(update_by_id(&sessions, "zzz", restore_session), sessions);

        let updated = update_by_id(&sessions, "b", |s| toggle_revision(s, "revision1"));
        assert_eq!(updated[0], sessions[0]);
        assert!(updated[1].revisions.get(0).unwrap().completed);
    }
}
