mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::dispatch;

#[derive(Parser)]
#[command(name = "studytrack", about = "Study sessions and spaced-repetition revisions", version)]
pub struct Cli {
    /// Directory holding the session database and settings file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Log a study session and schedule its revisions
    Log {
        subject: String,
        topic: String,
        /// Minutes studied
        #[arg(long, default_value = "60")]
        duration: u32,
        /// Study day as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Change a session's details; its revisions are rescheduled
    Edit {
        session_id: String,
        subject: String,
        topic: String,
        #[arg(long, default_value = "60")]
        duration: u32,
        #[arg(long)]
        date: Option<String>,
    },

    /// List sessions grouped by study day with each revision's status
    List {
        /// Include completed sessions
        #[arg(long)]
        all: bool,
    },

    /// Revisions due today and overdue
    Due,

    /// Mark a revision done, or undo it
    Toggle {
        session_id: String,
        /// Slot key such as revision2
        revision: String,
    },

    /// Reset every revision of a session and reopen it
    Restore { session_id: String },

    /// Permanently remove a session
    Delete { session_id: String },

    /// Completed sessions, optionally filtered by subject or topic
    Completed {
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Record a finished pomodoro or break block
    Pomodoro {
        subject: String,
        topic: String,
        #[arg(long, value_enum, default_value = "focus")]
        kind: BlockKind,
        /// Minutes; defaults to the configured length for the block kind
        #[arg(long)]
        duration: Option<u32>,
        /// Log the block against this revision number of the topic
        #[arg(long)]
        revision: Option<usize>,
    },

    /// Revision completion across all sessions
    Progress,

    /// Hours studied and exam countdown
    Summary,

    /// Show or change the revision schedule
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum BlockKind {
    Focus,
    ShortBreak,
    LongBreak,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the current revision settings
    Show,

    /// Set an explicit schedule
    Set {
        /// Number of revisions per session
        #[arg(long)]
        revisions: usize,
        /// Comma-separated days after the study date, e.g. 1,3,7,14
        #[arg(long, value_delimiter = ',')]
        intervals: Vec<u32>,
    },

    /// Four mandatory revisions plus up to four optional ones
    Preset {
        #[arg(long, default_value = "0")]
        optional: usize,
    },

    /// Set the exam date as YYYY-MM-DD, or clear it when omitted
    Exam { date: Option<String> },
}
