use anyhow::{bail, Context, Result};
use rusqlite::Connection;

const ENABLE_LOGS: bool = true;

/// Schema steps in order; step `i` takes `user_version` from `i` to `i + 1`.
const STEPS: &[(&str, &str)] = &[
    ("study sessions", include_str!("schemas/schema_v1.sql")),
    ("pomodoro blocks", include_str!("schemas/schema_v2.sql")),
];

const CURRENT_SCHEMA_VERSION: i32 = STEPS.len() as i32;

fn schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read schema version")
}

/// Bring the schema up to date in one transaction. Storage written by a newer
/// build is refused rather than downgraded.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let version = schema_version(conn)?;
    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "session storage is at schema {version}, newer than the supported {CURRENT_SCHEMA_VERSION}"
        );
    }

    let pending = &STEPS[version.max(0) as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction().context("failed to start schema upgrade")?;
    for (offset, (name, sql)) in pending.iter().enumerate() {
        let target = version + offset as i32 + 1;
        tx.execute_batch(sql)
            .with_context(|| format!("schema step {target} ({name}) failed"))?;
        crate::log_info!("Applied schema step {target}: {name}");
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to record schema version")?;
    tx.commit().context("failed to commit schema upgrade")?;

    Ok(())
}
