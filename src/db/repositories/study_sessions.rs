use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{date_to_sql, parse_date, parse_optional_datetime, parse_session_kind, to_u32},
};
use crate::models::{RevisionSlots, StudySession};

const SELECT_COLUMNS: &str =
    "SELECT id, date, subject, topic, duration, kind, revisions, is_completed, completed_at
     FROM study_sessions";

fn row_to_study_session(row: &Row) -> Result<StudySession> {
    let date: String = row.get("date")?;
    let duration: i64 = row.get("duration")?;
    let kind: String = row.get("kind")?;
    let revisions: String = row.get("revisions")?;
    let completed_at: Option<String> = row.get("completed_at")?;

    Ok(StudySession {
        id: row.get("id")?,
        date: parse_date(&date, "date")?,
        subject: row.get("subject")?,
        topic: row.get("topic")?,
        duration: to_u32(duration, "duration")?,
        kind: parse_session_kind(&kind)?,
        revisions: serde_json::from_str::<RevisionSlots>(&revisions)
            .context("failed to parse revisions")?,
        is_completed: row.get("is_completed")?,
        completed_at: parse_optional_datetime(completed_at, "completed_at")?,
    })
}

fn insert_row(conn: &Connection, position: i64, session: &StudySession) -> Result<()> {
    conn.execute(
        "INSERT INTO study_sessions (id, position, date, subject, topic, duration, kind, revisions, is_completed, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            session.id,
            position,
            date_to_sql(session.date),
            session.subject,
            session.topic,
            session.duration,
            session.kind.as_str(),
            serde_json::to_string(&session.revisions)?,
            session.is_completed,
            session.completed_at.map(|dt| dt.to_rfc3339()),
        ],
    )
    .with_context(|| format!("failed to insert study session {}", session.id))?;
    Ok(())
}

impl Database {
    pub async fn insert_study_session(&self, session: &StudySession) -> Result<()> {
        let record = session.clone();
        self.execute("store new study session", move |conn| {
            let position: i64 = conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM study_sessions",
                [],
                |row| row.get(0),
            )?;
            insert_row(conn, position, &record)
        })
        .await
    }

    /// Sessions in the order they were logged.
    pub async fn list_study_sessions(&self) -> Result<Vec<StudySession>> {
        self.execute("list study sessions", |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY position ASC"))?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_study_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    /// Replace the stored collection with `sessions` in one transaction, for
    /// changes that can touch any number of sessions at once (toggles,
    /// restores, settings changes).
    pub async fn replace_study_sessions(&self, sessions: &[StudySession]) -> Result<()> {
        let records = sessions.to_vec();
        self.execute("replace study sessions", move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM study_sessions", [])?;
            for (position, session) in records.iter().enumerate() {
                insert_row(&tx, position as i64, session)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Returns whether a row was removed; a missing id is not an error.
    pub async fn delete_study_session(&self, session_id: &str) -> Result<bool> {
        let session_id = session_id.to_string();
        self.execute("delete study session", move |conn| {
            let rows_affected = conn.execute(
                "DELETE FROM study_sessions WHERE id = ?1",
                params![session_id],
            )?;
            Ok(rows_affected > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_day;
    use crate::models::SessionKind;
    use crate::revisions::{generate_schedule, RevisionSettings};
    use chrono::{TimeZone, Utc};

    fn session(id: &str, date: &str) -> StudySession {
        let date = parse_day(date).unwrap();
        StudySession {
            id: id.into(),
            date,
            subject: "Chemistry".into(),
            topic: "Moles".into(),
            duration: 40,
            kind: SessionKind::Study,
            revisions: generate_schedule(date, &RevisionSettings::default()).unwrap(),
            is_completed: false,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn insert_and_list_preserve_order_and_fields() {
        let db = Database::in_memory().unwrap();
        let mut done = session("b", "2024-01-01");
        for record in done.revisions.iter_mut() {
            record.completed = true;
        }
        done.is_completed = true;
        done.completed_at = Some(Utc.with_ymd_and_hms(2024, 1, 20, 7, 0, 0).unwrap());

        db.insert_study_session(&session("a", "2024-01-05")).await.unwrap();
        db.insert_study_session(&done).await.unwrap();

        let listed = db.list_study_sessions().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "a");
        assert_eq!(listed[1], done);
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_collection() {
        let db = Database::in_memory().unwrap();
        db.insert_study_session(&session("old", "2024-01-01")).await.unwrap();

        let next = vec![session("x", "2024-02-01"), session("y", "2024-02-02")];
        db.replace_study_sessions(&next).await.unwrap();

        let listed = db.list_study_sessions().await.unwrap();
        assert_eq!(listed, next);
        assert!(listed.iter().all(|session| session.id != "old"));
    }

    #[tokio::test]
    async fn deleting_missing_session_is_not_an_error() {
        let db = Database::in_memory().unwrap();
        db.insert_study_session(&session("a", "2024-01-01")).await.unwrap();

        assert!(db.delete_study_session("a").await.unwrap());
        assert!(!db.delete_study_session("a").await.unwrap());
    }

    #[tokio::test]
    async fn storage_errors_name_the_failed_action() {
        let db = Database::in_memory().unwrap();
        db.execute("drop study sessions", |conn| {
            conn.execute_batch("DROP TABLE study_sessions")?;
            Ok(())
        })
        .await
        .unwrap();

        let err = db.list_study_sessions().await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to list study sessions"));
    }
}
