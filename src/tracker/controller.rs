use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::{
    db::Database,
    models::{PomodoroSession, SessionInput, StudySession},
    revisions::RevisionSettings,
    settings::SettingsStore,
};

use super::{SettingsChange, TrackerSnapshot, TrackerState};

const ENABLE_LOGS: bool = true;

/// Owner of the canonical session list.
///
/// Each operation stages the next state, persists it, and only then swaps it
/// in, so a failed write leaves both memory and storage on the old snapshot.
#[derive(Clone)]
pub struct StudyTracker {
    state: Arc<Mutex<TrackerState>>,
    db: Database,
    settings: Arc<SettingsStore>,
}

impl StudyTracker {
    pub async fn open(db: Database, settings: SettingsStore) -> Result<Self> {
        let revision_settings = settings.revision_settings();
        let stored = db.list_study_sessions().await?;
        let state = TrackerState::load(stored.clone(), revision_settings, Utc::now())
            .context("failed to reconcile stored sessions")?;

        if state.sessions() != stored.as_slice() {
            crate::log_info!(
                "Reconciled {} stored sessions against current revision settings",
                stored.len()
            );
            db.replace_study_sessions(state.sessions()).await?;
        }

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            db,
            settings: Arc::new(settings),
        })
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        self.state.lock().await.snapshot()
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings
    }

    async fn apply<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TrackerState) -> Result<T>,
    {
        let mut guard = self.state.lock().await;
        let (next, outcome) = guard.staged(f)?;
        if !Arc::ptr_eq(&guard.snapshot().sessions, &next.snapshot().sessions) {
            self.db.replace_study_sessions(next.sessions()).await?;
        }
        *guard = next;
        Ok(outcome)
    }

    pub async fn log_session(&self, input: SessionInput) -> Result<StudySession> {
        let mut guard = self.state.lock().await;
        let (next, session) = guard.staged(|state| state.log_session(input, Utc::now()))?;
        self.db.insert_study_session(&session).await?;
        *guard = next;

        crate::log_info!(
            "Logged session {} ({} / {}) with {} revisions",
            session.id,
            session.subject,
            session.topic,
            session.revisions.len()
        );
        Ok(session)
    }

    pub async fn edit_session(&self, session_id: &str, input: SessionInput) -> Result<bool> {
        self.apply(|state| state.edit_session(session_id, input, Utc::now()))
            .await
    }

    pub async fn toggle_revision(&self, session_id: &str, slot_key: &str) -> Result<bool> {
        let changed = self
            .apply(|state| Ok(state.toggle_revision(session_id, slot_key, Utc::now())))
            .await?;
        if !changed {
            crate::log_debug!("Toggle of {slot_key} on {session_id} had no effect");
        }
        Ok(changed)
    }

    pub async fn restore_session(&self, session_id: &str) -> Result<bool> {
        self.apply(|state| Ok(state.restore_session(session_id, Utc::now())))
            .await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let mut guard = self.state.lock().await;
        let (next, removed) = guard.staged(|state| Ok(state.delete_session(session_id, Utc::now())))?;
        if removed {
            self.db.delete_study_session(session_id).await?;
            crate::log_info!("Deleted session {session_id}");
        }
        *guard = next;
        Ok(removed)
    }

    /// Validate, persist and apply new revision settings, reconciling every
    /// session. Nothing is written when the settings are invalid.
    ///
    /// The settings file is written before the sessions. If the sessions
    /// cannot be stored the file is put back, so storage never holds a
    /// schedule the settings file does not describe.
    pub async fn update_revision_settings(&self, settings: RevisionSettings) -> Result<SettingsChange> {
        settings.validate().context("Rejected revision settings")?;

        let mut guard = self.state.lock().await;
        let (next, change) = guard.staged(|state| state.update_settings(settings.clone(), Utc::now()))?;

        let previous = self.settings.get();
        self.settings.update_revision_settings(settings)?;
        if let Err(err) = self.db.replace_study_sessions(next.sessions()).await {
            if let Err(restore_err) = self.settings.update(previous) {
                crate::log_error!(
                    "Could not restore {} after failed session write: {restore_err:#}",
                    self.settings.path().display()
                );
            }
            return Err(err.context("failed to store sessions for new revision settings"));
        }
        *guard = next;

        crate::log_info!(
            "Applied revision settings v{}: {} reopened, {} completed",
            guard.settings_version(),
            change.reopened.len(),
            change.completed.len()
        );
        Ok(change)
    }

    pub async fn record_pomodoro(&self, block: PomodoroSession) -> Result<()> {
        if block.subject.is_empty() || block.topic.is_empty() {
            bail!("pomodoro blocks need a subject and a topic");
        }
        if block.duration == 0 {
            bail!("pomodoro duration must be a positive number of minutes");
        }
        self.db.insert_pomodoro_session(&block).await?;
        crate::log_debug!(
            "Recorded {} block of {}m for {} / {}",
            block.session_type.as_str(),
            block.duration,
            block.subject,
            block.topic
        );
        Ok(())
    }

    pub async fn pomodoros(&self, date: Option<NaiveDate>) -> Result<Vec<PomodoroSession>> {
        self.db.list_pomodoro_sessions(date).await
    }
}
