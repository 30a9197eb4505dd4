//! openclaw-storage: SQLite-based persistence for per-session tool overrides.
//!
//! Each session's overrides are stored as a single JSON document so fields
//! this build does not know about survive write-through. Updates run under
//! the connection lock: the mutator sees a freshly-read record and the write
//! commits before the call returns.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use tokio::sync::Mutex;

use openclaw_types::SessionOverrides;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StorageError>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS session_overrides (
    session_key TEXT PRIMARY KEY,
    overrides TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);";

/// SQLite-backed store for per-session tool overrides.
pub struct SessionOverrideStore {
    conn: Arc<Mutex<Connection>>,
}

impl SessionOverrideStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!("Session override store opened: {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Read a session's override record.
    pub async fn get(&self, session_key: &str) -> Result<Option<SessionOverrides>> {
        let conn = self.conn.clone();
        let session_key = session_key.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            read_record(&conn, &session_key)
        })
        .await?
    }

    /// Load the session's record (empty if missing), apply the mutator, and
    /// write the result back. The read-modify-write runs under the
    /// connection lock, so updates to the same session serialize.
    pub async fn update<F>(&self, session_key: &str, mutator: F) -> Result<SessionOverrides>
    where
        F: FnOnce(&mut SessionOverrides) + Send + 'static,
    {
        let conn = self.conn.clone();
        let session_key = session_key.to_string();
        let now = chrono::Utc::now().timestamp_millis();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut record = read_record(&conn, &session_key)?.unwrap_or_default();
            mutator(&mut record);
            write_record(&conn, &session_key, &record, now)?;
            Ok(record)
        })
        .await?
    }

    /// Clear all tool override fields for a session.
    ///
    /// Returns whether any override was previously set. Unknown fields in
    /// the record are preserved.
    pub async fn reset(&self, session_key: &str) -> Result<bool> {
        let conn = self.conn.clone();
        let session_key = session_key.to_string();
        let now = chrono::Utc::now().timestamp_millis();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut record = read_record(&conn, &session_key)?.unwrap_or_default();
            let had_overrides = record.has_tool_overrides();
            record.clear_tool_overrides();
            write_record(&conn, &session_key, &record, now)?;
            Ok(had_overrides)
        })
        .await?
    }
}

fn read_record(conn: &Connection, session_key: &str) -> Result<Option<SessionOverrides>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT overrides FROM session_overrides WHERE session_key = ?1",
            rusqlite::params![session_key],
            |row| row.get(0),
        )
        .optional()?;
    match json {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn write_record(
    conn: &Connection,
    session_key: &str,
    record: &SessionOverrides,
    now: i64,
) -> Result<()> {
    let json = serde_json::to_string(record)?;
    conn.execute(
        "INSERT INTO session_overrides (session_key, overrides, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(session_key) DO UPDATE SET
            overrides = excluded.overrides,
            updated_at = excluded.updated_at",
        rusqlite::params![session_key, json, now],
    )?;
    Ok(())
}
