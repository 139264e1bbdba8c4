use chrono::NaiveDate;

use crate::dates::add_days;
use crate::models::{RevisionRecord, RevisionSlots};
use crate::revisions::config::{RevisionSettings, SettingsError};

/// Due date of slot `index` for a session studied on `study_date`.
pub(crate) fn due_date(
    study_date: NaiveDate,
    settings: &RevisionSettings,
    index: usize,
) -> Result<NaiveDate, SettingsError> {
    let days = settings
        .interval_for(index)
        .ok_or(SettingsError::NoIntervals)?;
    Ok(add_days(study_date, days))
}

/// Fresh revision slots for a session studied on `study_date`.
///
/// Produces exactly `settings.number_of_revisions` incomplete slots. Fails
/// without producing anything when the settings are invalid.
pub fn generate_schedule(
    study_date: NaiveDate,
    settings: &RevisionSettings,
) -> Result<RevisionSlots, SettingsError> {
    settings.validate()?;

    (0..settings.number_of_revisions)
        .map(|index| due_date(study_date, settings, index).map(RevisionRecord::pending))
        .collect::<Result<Vec<_>, _>>()
        .map(RevisionSlots::new)
}
