use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{SessionInput, SessionKind, StudySession};
use crate::revisions::{
    generate_schedule,
    lifecycle::{reevaluate_lifecycle, restore_session, state_changes, toggle_revision, update_by_id},
    reconcile, RevisionSettings,
};

/// Canonical sessions and the settings they were reconciled against.
///
/// Both are immutable snapshots; every operation builds the next collection,
/// re-runs the lifecycle pass over it and swaps it in.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    sessions: Arc<Vec<StudySession>>,
    settings: Arc<RevisionSettings>,
    /// Bumped on every accepted settings change.
    settings_version: u64,
}

#[derive(Debug, Clone)]
pub struct TrackerSnapshot {
    pub sessions: Arc<Vec<StudySession>>,
    pub settings: Arc<RevisionSettings>,
    pub settings_version: u64,
}

/// Outcome of a settings change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsChange {
    pub reopened: Vec<String>,
    pub completed: Vec<String>,
}

fn validate_input(input: &SessionInput) -> Result<()> {
    if input.subject.trim().is_empty() {
        bail!("subject must not be empty");
    }
    if input.topic.trim().is_empty() {
        bail!("topic must not be empty");
    }
    if input.duration == 0 {
        bail!("duration must be a positive number of minutes");
    }
    Ok(())
}

impl TrackerState {
    /// Stored sessions brought in line with `settings`. Sessions written under
    /// an older schedule are reconciled before anyone sees them.
    pub fn load(
        sessions: Vec<StudySession>,
        settings: RevisionSettings,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let reconciled = reconcile(&sessions, &settings)?;
        Ok(Self {
            sessions: Arc::new(reevaluate_lifecycle(&reconciled, now)),
            settings: Arc::new(settings),
            settings_version: 0,
        })
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            sessions: Arc::clone(&self.sessions),
            settings: Arc::clone(&self.settings),
            settings_version: self.settings_version,
        }
    }

    pub fn sessions(&self) -> &[StudySession] {
        &self.sessions
    }

    pub fn settings(&self) -> &RevisionSettings {
        &self.settings
    }

    pub fn settings_version(&self) -> u64 {
        self.settings_version
    }

    pub fn find(&self, session_id: &str) -> Option<&StudySession> {
        self.sessions.iter().find(|session| session.id == session_id)
    }

    fn contains(&self, session_id: &str) -> bool {
        self.find(session_id).is_some()
    }

    /// Lifecycle pass over `next`, then swap. Returns whether anything changed.
    fn commit(&mut self, next: Vec<StudySession>, now: DateTime<Utc>) -> bool {
        let next = reevaluate_lifecycle(&next, now);
        if next.as_slice() == self.sessions.as_slice() {
            return false;
        }
        self.sessions = Arc::new(next);
        true
    }

    /// The next state without touching this one, for callers that persist
    /// before swapping.
    pub fn staged<F, T>(&self, f: F) -> Result<(Self, T)>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut next = self.clone();
        let outcome = f(&mut next)?;
        Ok((next, outcome))
    }

    pub fn log_session(&mut self, input: SessionInput, now: DateTime<Utc>) -> Result<StudySession> {
        validate_input(&input)?;

        let session = StudySession {
            id: Uuid::new_v4().to_string(),
            date: input.date,
            subject: input.subject.trim().to_string(),
            topic: input.topic.trim().to_string(),
            duration: input.duration,
            kind: SessionKind::Study,
            revisions: generate_schedule(input.date, &self.settings)?,
            is_completed: false,
            completed_at: None,
        };

        let mut next = self.sessions.as_ref().clone();
        next.push(session.clone());
        self.commit(next, now);
        Ok(session)
    }

    /// Replace the session's details. A new study date means a new schedule,
    /// so its revisions start over.
    pub fn edit_session(
        &mut self,
        session_id: &str,
        input: SessionInput,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        validate_input(&input)?;
        if !self.contains(session_id) {
            return Ok(false);
        }

        let revisions = generate_schedule(input.date, &self.settings)?;
        let next = update_by_id(&self.sessions, session_id, |session| StudySession {
            date: input.date,
            subject: input.subject.trim().to_string(),
            topic: input.topic.trim().to_string(),
            duration: input.duration,
            revisions: revisions.clone(),
            ..session.clone()
        });
        Ok(self.commit(next, now))
    }

    pub fn toggle_revision(&mut self, session_id: &str, slot_key: &str, now: DateTime<Utc>) -> bool {
        let next = update_by_id(&self.sessions, session_id, |session| {
            toggle_revision(session, slot_key)
        });
        self.commit(next, now)
    }

    pub fn restore_session(&mut self, session_id: &str, now: DateTime<Utc>) -> bool {
        let next = update_by_id(&self.sessions, session_id, restore_session);
        self.commit(next, now)
    }

    pub fn delete_session(&mut self, session_id: &str, now: DateTime<Utc>) -> bool {
        let next: Vec<StudySession> = self
            .sessions
            .iter()
            .filter(|session| session.id != session_id)
            .cloned()
            .collect();
        self.commit(next, now)
    }

    /// Reconcile every session against `settings`. Invalid settings are
    /// rejected before anything changes.
    pub fn update_settings(
        &mut self,
        settings: RevisionSettings,
        now: DateTime<Utc>,
    ) -> Result<SettingsChange> {
        let reconciled = reconcile(&self.sessions, &settings)?;
        let evaluated = reevaluate_lifecycle(&reconciled, now);

        let mut change = SettingsChange::default();
        for id in state_changes(&self.sessions, &evaluated) {
            let now_completed = evaluated
                .iter()
                .any(|session| session.id == id && session.is_completed);
            if now_completed {
                change.completed.push(id.to_string());
            } else {
                change.reopened.push(id.to_string());
            }
        }

        self.sessions = Arc::new(evaluated);
        self.settings = Arc::new(settings);
        self.settings_version += 1;
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_day;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn input(subject: &str, topic: &str) -> SessionInput {
        SessionInput {
            date: parse_day("2024-01-01").unwrap(),
            subject: subject.into(),
            topic: topic.into(),
            duration: 60,
        }
    }

    fn complete_all(state: &mut TrackerState, id: &str) {
        let slots = state.find(id).unwrap().revisions.len();
        for n in 1..=slots {
            state.toggle_revision(id, &format!("revision{n}"), now());
        }
    }

    #[test]
    fn logged_session_gets_current_schedule() {
        let mut state = TrackerState::default();
        let session = state.log_session(input(" Math ", "Limits"), now()).unwrap();

        assert_eq!(session.subject, "Math");
        assert_eq!(session.revisions.len(), 4);
        assert!(!session.is_completed);
        assert_eq!(state.sessions().len(), 1);
    }

    #[test]
    fn rejects_blank_fields_and_zero_duration() {
        let mut state = TrackerState::default();
        assert!(state.log_session(input("  ", "Limits"), now()).is_err());
        let mut zero = input("Math", "Limits");
        zero.duration = 0;
        assert!(state.log_session(zero, now()).is_err());
        assert!(state.sessions().is_empty());
    }

    #[test]
    fn completing_last_slot_completes_session() {
        let mut state = TrackerState::default();
        let id = state.log_session(input("Math", "Limits"), now()).unwrap().id;
        complete_all(&mut state, &id);

        let session = state.find(&id).unwrap();
        assert!(session.is_completed);
        assert_eq!(session.completed_at, Some(now()));
    }

    #[test]
    fn unknown_ids_leave_state_untouched() {
        let mut state = TrackerState::default();
        state.log_session(input("Math", "Limits"), now()).unwrap();
        let before = state.snapshot();

        assert!(!state.toggle_revision("missing", "revision1", now()));
        assert!(!state.restore_session("missing", now()));
        assert!(!state.delete_session("missing", now()));
        assert!(!state.edit_session("missing", input("Art", "Colour"), now()).unwrap());
        assert!(Arc::ptr_eq(&before.sessions, &state.snapshot().sessions));
    }

    #[test]
    fn settings_change_reports_reopened_and_completed_sessions() {
        let mut state = TrackerState::default();
        let id = state.log_session(input("Math", "Limits"), now()).unwrap().id;
        complete_all(&mut state, &id);

        let grown = RevisionSettings::with_optional(2).unwrap();
        let change = state.update_settings(grown, now()).unwrap();
        assert_eq!(change.reopened, vec![id.clone()]);
        assert_eq!(state.settings_version(), 1);
        assert_eq!(state.find(&id).unwrap().revisions.completed_count(), 4);

        let change = state.update_settings(RevisionSettings::default(), now()).unwrap();
        assert_eq!(change.completed, vec![id.clone()]);
        assert!(state.find(&id).unwrap().is_completed);
    }

    #[test]
    fn invalid_settings_change_nothing() {
        let mut state = TrackerState::default();
        state.log_session(input("Math", "Limits"), now()).unwrap();
        let before = state.snapshot();

        let broken = RevisionSettings {
            number_of_revisions: 0,
            intervals: vec![1],
        };
        assert!(state.update_settings(broken, now()).is_err());
        assert_eq!(state.settings_version(), 0);
        assert!(Arc::ptr_eq(&before.sessions, &state.snapshot().sessions));
    }

    #[test]
    fn editing_regenerates_schedule_from_new_date() {
        let mut state = TrackerState::default();
        let id = state.log_session(input("Math", "Limits"), now()).unwrap().id;
        state.toggle_revision(&id, "revision1", now());

        let mut moved = input("Math", "Limits and continuity");
        moved.date = parse_day("2024-01-05").unwrap();
        assert!(state.edit_session(&id, moved, now()).unwrap());

        let session = state.find(&id).unwrap();
        assert_eq!(session.topic, "Limits and continuity");
        assert_eq!(session.revisions.get(0).unwrap().date, parse_day("2024-01-06").unwrap());
        assert_eq!(session.revisions.completed_count(), 0);
    }

    #[test]
    fn load_reconciles_stale_sessions() {
        let mut state = TrackerState::default();
        let id = state.log_session(input("Math", "Limits"), now()).unwrap().id;
        let stored = state.sessions().to_vec();

        let loaded = TrackerState::load(stored, RevisionSettings::with_optional(1).unwrap(), now()).unwrap();
        assert_eq!(loaded.find(&id).unwrap().revisions.len(), 5);
    }

    #[test]
    fn staged_changes_leave_current_state_alone() {
        let state = TrackerState::default();
        let (next, session) = state
            .staged(|next| next.log_session(input("Math", "Limits"), now()))
            .unwrap();
        assert!(state.sessions().is_empty());
        assert_eq!(next.find(&session.id), Some(&session));
    }
}
