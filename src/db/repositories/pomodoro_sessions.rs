use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{date_to_sql, parse_date, parse_datetime, parse_pomodoro_kind, to_u32},
};
use crate::models::PomodoroSession;

fn row_to_pomodoro(row: &Row) -> Result<PomodoroSession> {
    let date: String = row.get("date")?;
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;
    let duration: i64 = row.get("duration")?;
    let session_type: String = row.get("session_type")?;

    Ok(PomodoroSession {
        id: row.get("id")?,
        date: parse_date(&date, "date")?,
        start_time: parse_datetime(&start_time, "start_time")?,
        end_time: parse_datetime(&end_time, "end_time")?,
        duration: to_u32(duration, "duration")?,
        session_type: parse_pomodoro_kind(&session_type)?,
        subject: row.get("subject")?,
        topic: row.get("topic")?,
    })
}

impl Database {
    pub async fn insert_pomodoro_session(&self, block: &PomodoroSession) -> Result<()> {
        let record = block.clone();
        self.execute("record pomodoro block", move |conn| {
            conn.execute(
                "INSERT INTO pomodoro_sessions (id, date, start_time, end_time, duration, session_type, subject, topic)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    date_to_sql(record.date),
                    record.start_time.to_rfc3339(),
                    record.end_time.to_rfc3339(),
                    record.duration,
                    record.session_type.as_str(),
                    record.subject,
                    record.topic,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// All blocks, or only those on `date`, oldest first.
    pub async fn list_pomodoro_sessions(&self, date: Option<NaiveDate>) -> Result<Vec<PomodoroSession>> {
        self.execute("list pomodoro blocks", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, date, start_time, end_time, duration, session_type, subject, topic
                 FROM pomodoro_sessions
                 WHERE ?1 IS NULL OR date = ?1
                 ORDER BY start_time ASC",
            )?;

            let mut rows = stmt.query(params![date.map(date_to_sql)])?;
            let mut blocks = Vec::new();
            while let Some(row) = rows.next()? {
                blocks.push(row_to_pomodoro(row)?);
            }

            Ok(blocks)
        })
        .await
    }
}
