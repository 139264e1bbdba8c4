use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::revisions::RevisionSettings;

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub pomodoro_duration: u32,
    pub short_break_duration: u32,
    pub long_break_duration: u32,
    /// Pomodoros before a long break.
    pub long_break_interval: u32,
    pub daily_target_hours: f64,
    #[serde(with = "optional_day", skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
    pub exam_target_hours: f64,
    pub revision_settings: RevisionSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            pomodoro_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            long_break_interval: 4,
            daily_target_hours: 6.0,
            exam_date: None,
            exam_target_hours: 300.0,
            revision_settings: RevisionSettings::default(),
        }
    }
}

/// Empty strings count as "no exam date", as older settings files wrote them.
mod optional_day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::dates::DAY_FORMAT;

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format(DAY_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, DAY_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// JSON-file backed settings, readable from any thread.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AppSettings>,
}

impl SettingsStore {
    /// Unreadable or invalid files fall back to defaults rather than failing
    /// startup; the next successful update overwrites them.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<AppSettings>(&contents) {
                Ok(settings) if settings.revision_settings.validate().is_ok() => settings,
                Ok(_) => {
                    crate::log_warn!(
                        "Settings at {} have invalid revision settings; using defaults",
                        path.display()
                    );
                    AppSettings::default()
                }
                Err(err) => {
                    crate::log_warn!("Failed to parse settings at {}: {err}", path.display());
                    AppSettings::default()
                }
            }
        } else {
            AppSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn read(&self) -> RwLockReadGuard<'_, AppSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self) -> AppSettings {
        self.read().clone()
    }

    pub fn revision_settings(&self) -> RevisionSettings {
        self.read().revision_settings.clone()
    }

    /// Validates before anything is stored; invalid settings never reach disk.
    pub fn update_revision_settings(&self, settings: RevisionSettings) -> Result<()> {
        settings
            .validate()
            .context("Rejected revision settings")?;

        let mut guard = self.write();
        let mut next = guard.clone();
        next.revision_settings = settings;
        self.persist(&next)?;
        *guard = next;
        crate::log_info!(
            "Revision settings updated: {} revisions, intervals {:?}",
            guard.revision_settings.number_of_revisions,
            guard.revision_settings.intervals
        );
        Ok(())
    }

    pub fn update(&self, settings: AppSettings) -> Result<()> {
        settings
            .revision_settings
            .validate()
            .context("Rejected revision settings")?;

        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &AppSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("settings.json")).unwrap()
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get(), AppSettings::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn revision_settings_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let six = RevisionSettings::with_optional(2).unwrap();
        store.update_revision_settings(six.clone()).unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.revision_settings(), six);
    }

    #[test]
    fn invalid_revision_settings_are_rejected_and_not_written() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store
            .update_revision_settings(RevisionSettings {
                number_of_revisions: 0,
                intervals: vec![1],
            })
            .unwrap_err();

        assert!(format!("{err:#}").contains("at least 1"));
        assert_eq!(store.revision_settings(), RevisionSettings::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.get(), AppSettings::default());
    }

    #[test]
    fn reads_browser_settings_shape() {
        let json = r#"{
            "pomodoroDuration": 50,
            "shortBreakDuration": 10,
            "longBreakDuration": 20,
            "dailyTargetHours": 8,
            "examDate": "",
            "examTargetHours": 400,
            "revisionSettings": { "numberOfRevisions": 5, "intervals": [1, 3, 7, 14, 24] }
        }"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.pomodoro_duration, 50);
        assert_eq!(settings.long_break_interval, 4);
        assert_eq!(settings.exam_date, None);
        assert_eq!(settings.revision_settings.number_of_revisions, 5);
    }
}
