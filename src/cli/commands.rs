use anyhow::{bail, Result};
use chrono::{Local, Utc};
use serde::Serialize;

use super::{BlockKind, Command, OutputFormat, SettingsCommand};
use crate::{
    dates::{format_day, parse_day, today},
    metrics::{format_minutes, revision_time_by_slot, revision_time_spent, study_summary},
    models::{revision_topic, PomodoroKind, PomodoroSession, SessionInput, StudySession},
    revisions::{
        reports::{
            completed_sessions, overdue_revisions, revision_label, revision_progress,
            revisions_due, sessions_by_date, RevisionItem,
        },
        status::resolve_status_now,
        RevisionSettings,
    },
    settings::AppSettings,
    tracker::StudyTracker,
};

const ENABLE_LOGS: bool = true;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn session_input(subject: String, topic: String, duration: u32, date: Option<String>) -> Result<SessionInput> {
    let date = match date {
        Some(raw) => parse_day(&raw)?,
        None => today(),
    };
    Ok(SessionInput {
        date,
        subject,
        topic,
        duration,
    })
}

fn print_items(title: &str, items: &[RevisionItem], intervals: &[u32]) {
    if items.is_empty() {
        return;
    }
    println!("{title}:");
    for item in items {
        let label = revision_label(&item.revision_key, intervals).unwrap_or_else(|| item.revision_key.clone());
        let late = if item.days_past_due > 0 {
            format!(" ({}d late)", item.days_past_due)
        } else {
            String::new()
        };
        println!(
            "  {}  {} / {}  {}{}  [{}]",
            format_day(item.revision_date),
            item.subject,
            item.topic,
            label,
            late,
            item.session_id
        );
    }
}

fn print_session(session: &StudySession, intervals: &[u32], pomodoros: &[PomodoroSession]) {
    let marker = if session.is_completed { "done" } else { "active" };
    let revised: u32 =
        revision_time_by_slot(&session.subject, &session.topic, pomodoros, session.revisions.len())
            .iter()
            .sum();
    let revised = match format_minutes(revised) {
        minutes if minutes.is_empty() => String::new(),
        minutes => format!(", revised {minutes}"),
    };
    println!(
        "  {} / {} ({}m, {}{})  [{}]",
        session.subject, session.topic, session.duration, marker, revised, session.id
    );
    for (key, record) in session.revisions.entries() {
        let label = revision_label(&key, intervals).unwrap_or_else(|| key.clone());
        let spent = format_minutes(revision_time_spent(&session.subject, &session.topic, &key, pomodoros));
        let spent = if spent.is_empty() { spent } else { format!(" {spent}") };
        println!(
            "      {:<14} {}  {}{}",
            label,
            format_day(record.date),
            resolve_status_now(record).as_str(),
            spent
        );
    }
}

pub async fn dispatch(tracker: &StudyTracker, command: Command, format: OutputFormat) -> Result<()> {
    match command {
        Command::Log {
            subject,
            topic,
            duration,
            date,
        } => {
            let session = tracker
                .log_session(session_input(subject, topic, duration, date)?)
                .await?;
            match format {
                OutputFormat::Json => print_json(&session)?,
                OutputFormat::Plain => {
                    println!("Logged {} / {} [{}]", session.subject, session.topic, session.id);
                    for (key, record) in session.revisions.entries() {
                        println!("  {key}: {}", format_day(record.date));
                    }
                }
            }
        }

        Command::Edit {
            session_id,
            subject,
            topic,
            duration,
            date,
        } => {
            let input = session_input(subject, topic, duration, date)?;
            if !tracker.edit_session(&session_id, input).await? {
                println!("No session {session_id}; nothing changed");
            }
        }

        Command::List { all } => {
            let snapshot = tracker.snapshot().await;
            let pomodoros = tracker.pomodoros(None).await?;
            let visible: Vec<StudySession> = snapshot
                .sessions
                .iter()
                .filter(|session| all || !session.is_completed)
                .cloned()
                .collect();

            match format {
                OutputFormat::Json => print_json(&visible)?,
                OutputFormat::Plain => {
                    if visible.is_empty() {
                        println!("No sessions");
                    }
                    for (day, group) in sessions_by_date(&visible) {
                        println!("{day}");
                        for session in group {
                            print_session(session, &snapshot.settings.intervals, &pomodoros);
                        }
                    }
                }
            }
        }

        Command::Due => {
            let snapshot = tracker.snapshot().await;
            let today = today();
            let due = revisions_due(&snapshot.sessions, today);
            let overdue = overdue_revisions(&snapshot.sessions, today);

            match format {
                OutputFormat::Json => {
                    print_json(&serde_json::json!({ "due": due, "overdue": overdue }))?
                }
                OutputFormat::Plain => {
                    if due.is_empty() && overdue.is_empty() {
                        println!("Nothing due today");
                    }
                    print_items("Due today", &due, &snapshot.settings.intervals);
                    print_items("Overdue", &overdue, &snapshot.settings.intervals);
                }
            }
        }

        Command::Toggle {
            session_id,
            revision,
        } => {
            if !tracker.toggle_revision(&session_id, &revision).await? {
                println!("No revision {revision} on session {session_id}; nothing changed");
            }
        }

        Command::Restore { session_id } => {
            if !tracker.restore_session(&session_id).await? {
                println!("Session {session_id} not found or already fresh");
            }
        }

        Command::Delete { session_id } => {
            if !tracker.delete_session(&session_id).await? {
                println!("No session {session_id}");
            }
        }

        Command::Completed { search } => {
            let snapshot = tracker.snapshot().await;
            let done = completed_sessions(&snapshot.sessions, &search);
            match format {
                OutputFormat::Json => print_json(&done)?,
                OutputFormat::Plain => {
                    for session in done {
                        let at = session
                            .completed_at
                            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "-".into());
                        println!("{at}  {} / {}  [{}]", session.subject, session.topic, session.id);
                    }
                }
            }
        }

        Command::Pomodoro {
            subject,
            topic,
            kind,
            duration,
            revision,
        } => {
            let app_settings = tracker.settings_store().get();
            let (session_type, configured) = match kind {
                BlockKind::Focus => (PomodoroKind::Pomodoro, app_settings.pomodoro_duration),
                BlockKind::ShortBreak => (PomodoroKind::ShortBreak, app_settings.short_break_duration),
                BlockKind::LongBreak => (PomodoroKind::LongBreak, app_settings.long_break_duration),
            };
            let topic = match revision {
                Some(0) => bail!("revision numbers start at 1"),
                Some(number) => revision_topic(&topic, number),
                None => topic,
            };

            let block = PomodoroSession::finished(
                session_type,
                &subject,
                &topic,
                duration.unwrap_or(configured),
                Utc::now(),
            );
            tracker.record_pomodoro(block.clone()).await?;
            match format {
                OutputFormat::Json => print_json(&block)?,
                OutputFormat::Plain => println!(
                    "Recorded {}m {} for {} / {}",
                    block.duration,
                    block.session_type.as_str(),
                    block.subject,
                    block.topic
                ),
            }
        }

        Command::Progress => {
            let snapshot = tracker.snapshot().await;
            let progress = revision_progress(&snapshot.sessions);
            match format {
                OutputFormat::Json => print_json(&progress)?,
                OutputFormat::Plain => println!(
                    "{}/{} revisions done ({:.0}%)",
                    progress.completed, progress.total, progress.percentage
                ),
            }
        }

        Command::Summary => {
            let snapshot = tracker.snapshot().await;
            let pomodoros = tracker.pomodoros(None).await?;
            let app_settings = tracker.settings_store().get();
            let summary = study_summary(
                &snapshot.sessions,
                &pomodoros,
                app_settings.daily_target_hours,
                app_settings.exam_date,
                Local::now().naive_local(),
            );
            match format {
                OutputFormat::Json => print_json(&summary)?,
                OutputFormat::Plain => {
                    println!(
                        "Today: {:.1}h of {:.1}h ({:.0}%)",
                        summary.hours_today,
                        summary.daily_target_hours,
                        summary.target_percentage()
                    );
                    println!("Total: {:.1}h", summary.total_hours);
                    if app_settings.exam_date.is_some() {
                        println!("Exam in {} days", summary.days_until_exam);
                    }
                    for subject in &summary.by_subject {
                        println!("  {:<20} {:.1}h", subject.subject, subject.hours);
                    }
                }
            }
        }

        Command::Settings(command) => settings_command(tracker, command, format).await?,
    }

    Ok(())
}

async fn settings_command(tracker: &StudyTracker, command: SettingsCommand, format: OutputFormat) -> Result<()> {
    let next = match command {
        SettingsCommand::Show => {
            let settings = tracker.snapshot().await.settings;
            match format {
                OutputFormat::Json => print_json(settings.as_ref())?,
                OutputFormat::Plain => println!(
                    "{} revisions at {:?} days",
                    settings.number_of_revisions, settings.intervals
                ),
            }
            return Ok(());
        }
        SettingsCommand::Set {
            revisions,
            intervals,
        } => RevisionSettings::new(revisions, intervals)?,
        SettingsCommand::Preset { optional } => RevisionSettings::with_optional(optional)?,
        SettingsCommand::Exam { date } => {
            let exam_date = date.as_deref().map(parse_day).transpose()?;
            let store = tracker.settings_store();
            store.update(AppSettings {
                exam_date,
                ..store.get()
            })?;
            match (format, exam_date) {
                (OutputFormat::Json, _) => print_json(&store.get())?,
                (OutputFormat::Plain, Some(date)) => println!("Exam date set to {}", format_day(date)),
                (OutputFormat::Plain, None) => println!("Exam date cleared"),
            }
            return Ok(());
        }
    };

    if next.intervals.len() < next.number_of_revisions {
        crate::log_warn!(
            "Only {} intervals for {} revisions; later revisions reuse {} days",
            next.intervals.len(),
            next.number_of_revisions,
            next.intervals.last().copied().unwrap_or_default()
        );
    }
    let change = tracker.update_revision_settings(next).await?;
    match format {
        OutputFormat::Json => print_json(&change)?,
        OutputFormat::Plain => {
            println!("Revision settings updated");
            if !change.reopened.is_empty() {
                println!("  Reopened: {}", change.reopened.join(", "));
            }
            if !change.completed.is_empty() {
                println!("  Completed: {}", change.completed.join(", "));
            }
        }
    }
    Ok(())
}
