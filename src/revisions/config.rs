use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Intervals every schedule starts from.
pub const MANDATORY_INTERVALS: [u32; 4] = [1, 3, 7, 14];

/// Intervals for the optional fifth through eighth revisions.
pub const OPTIONAL_INTERVALS: [u32; 4] = [24, 39, 54, 81];

pub const MAX_REVISIONS: usize = MANDATORY_INTERVALS.len() + OPTIONAL_INTERVALS.len();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("number of revisions must be at least 1")]
    NoRevisions,
    #[error("at least one revision interval is required")]
    NoIntervals,
    #[error("revision interval {index} must be a positive number of days")]
    ZeroInterval { index: usize },
    #[error("at most {max} optional revisions can be enabled, got {requested}")]
    TooManyOptional { requested: usize, max: usize },
}

/// How many revisions each session gets and how far apart they are.
///
/// `intervals[i]` is the number of days after the study date that slot `i`
/// falls due. Slots beyond the end of the list reuse the last interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSettings {
    pub number_of_revisions: usize,
    pub intervals: Vec<u32>,
}

impl Default for RevisionSettings {
    fn default() -> Self {
        Self {
            number_of_revisions: MANDATORY_INTERVALS.len(),
            intervals: MANDATORY_INTERVALS.to_vec(),
        }
    }
}

impl RevisionSettings {
    /// Build and validate in one step.
    pub fn new(number_of_revisions: usize, intervals: Vec<u32>) -> Result<Self, SettingsError> {
        let settings = Self {
            number_of_revisions,
            intervals,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// The four mandatory revisions plus the first `optional` extra ones.
    pub fn with_optional(optional: usize) -> Result<Self, SettingsError> {
        if optional > OPTIONAL_INTERVALS.len() {
            return Err(SettingsError::TooManyOptional {
                requested: optional,
                max: OPTIONAL_INTERVALS.len(),
            });
        }

        let intervals: Vec<u32> = MANDATORY_INTERVALS
            .iter()
            .chain(OPTIONAL_INTERVALS.iter().take(optional))
            .copied()
            .collect();

        Ok(Self {
            number_of_revisions: intervals.len(),
            intervals,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.number_of_revisions == 0 {
            return Err(SettingsError::NoRevisions);
        }
        if self.intervals.is_empty() {
            return Err(SettingsError::NoIntervals);
        }
        if let Some(index) = self.intervals.iter().position(|days| *days == 0) {
            return Err(SettingsError::ZeroInterval { index });
        }
        Ok(())
    }

    /// Days after the study date for slot `index`, falling back to the last
    /// configured interval when the list is shorter than the slot count.
    ///
    /// Returns `None` only when there are no intervals at all.
    pub fn interval_for(&self, index: usize) -> Option<u32> {
        self.intervals
            .get(index)
            .or_else(|| self.intervals.last())
            .copied()
    }
}
