pub mod config;
pub mod lifecycle;
pub mod reconcile;
pub mod reports;
pub mod schedule;
pub mod status;

pub use config::{RevisionSettings, SettingsError};
pub use lifecycle::{reevaluate_lifecycle, restore_session, toggle_revision};
pub use reconcile::reconcile;
pub use schedule::generate_schedule;
pub use status::{resolve_status, RevisionStatus};
