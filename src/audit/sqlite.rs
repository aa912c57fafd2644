//! SQLite-backed audit sink: one row per event.

use crate::audit::{AuditEvent, AuditSink};
use crate::db::Db;
use crate::error::{RegassistError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS audit_events (
    event_id TEXT PRIMARY KEY,
    seq INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    event TEXT NOT NULL,
    run_id TEXT,
    payload_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_events_run ON audit_events(run_id);";

/// Append-only audit table. Each `log` is a single INSERT, so records from
/// concurrent runs never interleave.
pub struct SqliteAuditLog {
    conn: Mutex<Connection>,
}

impl SqliteAuditLog {
    /// Open (creating if needed) the audit database at `db`.
    pub fn open(db: Db) -> Result<Self> {
        let conn = db.open_connection()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A panic mid-INSERT leaves no partial row, so a poisoned lock is safe to reuse.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn append(&self, event: &str, payload: &Value) -> Result<()> {
        let event_id = Uuid::new_v4().to_string();
        let timestamp = Utc::now().to_rfc3339();
        let run_id = payload.get("run_id").and_then(Value::as_str).map(String::from);
        let payload_json = serde_json::to_string(payload)?;

        self.conn().execute(
            r#"
            INSERT INTO audit_events (event_id, seq, timestamp, event, run_id, payload_json)
            VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM audit_events), ?2, ?3, ?4, ?5)
            "#,
            params![event_id, timestamp, event, run_id, payload_json],
        )?;
        Ok(())
    }

    /// All events in append order.
    pub fn events(&self) -> Result<Vec<AuditEvent>> {
        read_events(&self.conn())
    }

    /// Read events through a fresh connection, e.g. from a reporting process.
    pub async fn load_events(db: &Db) -> Result<Vec<AuditEvent>> {
        db.with_connection(|conn| {
            conn.execute_batch(SCHEMA)?;
            read_events(conn)
        })
        .await
    }
}

impl AuditSink for SqliteAuditLog {
    fn log(&self, event: &str, payload: &Value) {
        if let Err(e) = self.append(event, payload) {
            log::warn!("Dropping audit event '{}': {}", event, e);
        }
    }
}

fn read_events(conn: &Connection) -> Result<Vec<AuditEvent>> {
    let mut stmt = conn.prepare("SELECT timestamp, event, payload_json FROM audit_events ORDER BY seq")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (timestamp, event, payload_json) = row?;
        let ts = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| RegassistError::Parse(format!("bad audit timestamp '{}': {}", timestamp, e)))?
            .with_timezone(&Utc);
        out.push(AuditEvent {
            ts,
            event,
            payload: serde_json::from_str(&payload_json)?,
        });
    }
    Ok(out)
}
