// SQLite floor store - one row per session holding the serialized record.
//
// Saves are upserts inside the caller's session lock, so rows for a session
// are always written in the order the engine applied them.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use rostrum_core::{FloorStore, SessionFloor, StoreError};
use rostrum_types::SessionId;

use crate::fs_util::{ensure_secure_db_file, ensure_secure_dir};

pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS floor_sessions (
            session_id TEXT PRIMARY KEY,
            record_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    ";

    /// Open or create the floor database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_secure_dir(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        ensure_secure_db_file(path)
            .with_context(|| format!("Failed to secure database file: {}", path.display()))?;

        let db = Connection::open(path)
            .with_context(|| format!("Failed to open floor database at {}", path.display()))?;
        Self::initialize(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory floor database")?;
        Self::initialize(db)
    }

    fn initialize(db: Connection) -> Result<Self> {
        db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")
            .context("Failed to set floor database pragmas")?;
        db.execute_batch(Self::SCHEMA)
            .context("Failed to create floor database schema")?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// Session ids with a stored record, sorted.
    pub fn session_ids(&self) -> Result<Vec<SessionId>, StoreError> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = db
            .prepare("SELECT session_id FROM floor_sessions ORDER BY session_id")
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(backend)?;

        let mut ids = Vec::new();
        for row in rows {
            let raw = row.map_err(backend)?;
            match SessionId::new(raw) {
                Ok(id) => ids.push(id),
                Err(e) => tracing::warn!("Skipping stored session with invalid id: {e}"),
            }
        }
        Ok(ids)
    }
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(Box::new(err))
}

impl FloorStore for SqliteStore {
    fn load(&self, session: &SessionId) -> Result<Option<SessionFloor>, StoreError> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        let json: Option<String> = db
            .query_row(
                "SELECT record_json FROM floor_sessions WHERE session_id = ?1",
                params![session.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;

        Ok(json
            .map(|json| serde_json::from_str::<SessionFloor>(&json))
            .transpose()?)
    }

    fn save(&self, session: &SessionId, record: &SessionFloor) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.execute(
            "INSERT INTO floor_sessions (session_id, record_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET
                record_json = excluded.record_json,
                updated_at = excluded.updated_at",
            params![session.as_str(), json, updated_at],
        )
        .map_err(backend)?;
        Ok(())
    }
}
