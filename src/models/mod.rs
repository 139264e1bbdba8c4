pub mod pomodoro;
pub mod revision;
pub mod session;
pub mod subject;

pub use pomodoro::{revision_topic, PomodoroKind, PomodoroSession};
pub use revision::{parse_slot_key, slot_key, RevisionRecord, RevisionSlots};
pub use session::{SessionInput, SessionKind, StudySession};
pub use subject::same_subject;
