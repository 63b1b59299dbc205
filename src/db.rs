use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::models::{Monitor, NewMonitor};

pub fn open_and_init(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path).context("open sqlite db failed")?;

    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS monitors (
          id TEXT PRIMARY KEY,
          user_id TEXT NOT NULL,
          name TEXT NOT NULL,
          description TEXT,
          url TEXT NOT NULL,
          monitor_type TEXT NOT NULL,
          is_active INTEGER NOT NULL DEFAULT 1,
          interval_ms INTEGER NOT NULL,
          created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_monitors_user_id ON monitors(user_id);
        "#,
    )
    .context("db init batch failed")?;

    Ok(conn)
}

const MONITOR_COLUMNS: &str =
    "id, user_id, name, description, url, monitor_type, is_active, interval_ms, created_at";

fn monitor_from_row(row: &Row<'_>) -> rusqlite::Result<Monitor> {
    Ok(Monitor {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        url: row.get(4)?,
        monitor_type: row.get(5)?,
        is_active: row.get(6)?,
        interval_ms: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Fetch every monitor, oldest first
pub fn get_all_monitors(conn: &Connection) -> rusqlite::Result<Vec<Monitor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MONITOR_COLUMNS} FROM monitors ORDER BY created_at ASC, id ASC"
    ))?;

    let rows = stmt.query_map([], monitor_from_row)?;
    rows.collect()
}

/// Fetch a single monitor by id
pub fn get_monitor_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Monitor>> {
    let mut stmt = conn.prepare(&format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE id = ?1"))?;

    let mut rows = stmt.query_map([id], monitor_from_row)?;
    rows.next().transpose()
}

/// Fetch the monitors owned by one user, oldest first
pub fn get_monitors_by_user_id(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<Monitor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MONITOR_COLUMNS} FROM monitors WHERE user_id = ?1 ORDER BY created_at ASC, id ASC"
    ))?;

    let rows = stmt.query_map([user_id], monitor_from_row)?;
    rows.collect()
}

/// Insert or replace monitors in one transaction. Existing rows keep their `created_at`.
pub fn upsert_monitors(
    conn: &mut Connection,
    monitors: &[NewMonitor],
    created_at: &str,
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;

    for monitor in monitors {
        tx.execute(
            r#"
            INSERT INTO monitors (
                id, user_id, name, description, url, monitor_type, is_active, interval_ms, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                user_id=excluded.user_id,
                name=excluded.name,
                description=excluded.description,
                url=excluded.url,
                monitor_type=excluded.monitor_type,
                is_active=excluded.is_active,
                interval_ms=excluded.interval_ms
            "#,
            params![
                monitor.id,
                monitor.user_id,
                monitor.name,
                monitor.description,
                monitor.url,
                monitor.monitor_type,
                monitor.is_active,
                monitor.interval_ms,
                created_at
            ],
        )
        .inspect_err(|e| {
            tracing::error!(monitor_id = %monitor.id, error = ?e, "Failed to upsert monitor");
        })?;
    }

    tx.commit()?;
    Ok(monitors.len())
}
