pub mod controller;
pub mod state;

pub use controller::StudyTracker;
pub use state::{SettingsChange, TrackerSnapshot, TrackerState};
