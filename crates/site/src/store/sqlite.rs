//! SQLite-backed store.

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use rusqlite::{params, Connection, OptionalExtension, Row};
use site_contract::{CommandLogRecord, LeadRecord, SessionRecord};

use super::{FileRecord, NewLead, SiteStore, StoreError, ADMIN_LIST_LIMIT};

const SCHEMA: &str = "
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS command_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        command TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS files (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        filename TEXT NOT NULL,
        blob_path TEXT NOT NULL,
        mimetype TEXT NOT NULL,
        size INTEGER NOT NULL,
        uploaded_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS files_uploaded_at ON files (uploaded_at);
    CREATE INDEX IF NOT EXISTS files_blob_path ON files (blob_path);
    CREATE TABLE IF NOT EXISTS leads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        company TEXT NOT NULL,
        project_type TEXT,
        budget TEXT,
        created_at TEXT NOT NULL
    );
";

const FILE_COLUMNS: &str = "id, session_id, filename, blob_path, mimetype, size, uploaded_at";

/// [`SiteStore`] over one serialized SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    let size: i64 = row.get(5)?;
    Ok(FileRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        filename: row.get(2)?,
        blob_path: row.get(3)?,
        mimetype: row.get(4)?,
        size: u64::try_from(size).unwrap_or_default(),
        uploaded_at: row.get(6)?,
    })
}

fn list_limit() -> i64 {
    i64::try_from(ADMIN_LIST_LIMIT).unwrap_or(i64::MAX)
}

impl SiteStore for SqliteStore {
    fn create_session(&self, id: &str, created_at: &str) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT OR IGNORE INTO sessions (id, created_at) VALUES (?1, ?2)",
            params![id, created_at],
        )?;
        Ok(())
    }

    fn log_command(
        &self,
        session_id: &str,
        command: &str,
        timestamp: &str,
    ) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO command_log (session_id, command, timestamp) VALUES (?1, ?2, ?3)",
            params![session_id, command, timestamp],
        )?;
        Ok(())
    }

    fn insert_file(&self, record: &FileRecord) -> Result<(), StoreError> {
        self.conn()?.execute(
            &format!("INSERT INTO files ({FILE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                record.id,
                record.session_id,
                record.filename,
                record.blob_path,
                record.mimetype,
                i64::try_from(record.size).unwrap_or(i64::MAX),
                record.uploaded_at,
            ],
        )?;
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files ORDER BY uploaded_at DESC, rowid DESC"
        ))?;
        let files = stmt
            .query_map([], file_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    fn get_file(&self, id: &str) -> Result<Option<FileRecord>, StoreError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"),
                [id],
                file_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn find_file_by_blob_path(&self, blob_path: &str) -> Result<Option<FileRecord>, StoreError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE blob_path = ?1"),
                [blob_path],
                file_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn delete_file(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM files WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO leads (session_id, name, email, company, project_type, budget, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                lead.session_id,
                lead.name,
                lead.email,
                lead.company,
                lead.project_type,
                lead.budget,
                lead.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_leads(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, name, email, company, project_type, budget, created_at
             FROM leads ORDER BY id DESC LIMIT ?1",
        )?;
        let leads = stmt
            .query_map([list_limit()], |row| {
                Ok(LeadRecord {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    name: row.get(2)?,
                    email: row.get(3)?,
                    company: row.get(4)?,
                    project_type: row.get(5)?,
                    budget: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(leads)
    }

    fn list_command_logs(&self) -> Result<Vec<CommandLogRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, command, timestamp FROM command_log ORDER BY id DESC LIMIT ?1",
        )?;
        let logs = stmt
            .query_map([list_limit()], |row| {
                Ok(CommandLogRecord {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    command: row.get(2)?,
                    timestamp: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, created_at FROM sessions ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let sessions = stmt
            .query_map([list_limit()], |row| {
                Ok(SessionRecord {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("in-memory database")
    }

    #[test]
    fn sessions_ignore_duplicates() {
        contract::sessions_ignore_duplicates(&store());
    }

    #[test]
    fn files_list_newest_first_and_delete() {
        contract::files_list_newest_first_and_delete(&store());
    }

    #[test]
    fn leads_and_logs_round_trip() {
        contract::leads_and_logs_round_trip(&store());
    }

    #[test]
    fn data_survives_reopening_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("site.db");
        {
            let store = SqliteStore::open(&path).expect("open");
            store
                .insert_file(&contract::file("kept", "2024-01-01T00:00:00.000Z"))
                .expect("insert");
        }
        let reopened = SqliteStore::open(&path).expect("reopen");
        assert_eq!(
            reopened.get_file("kept").expect("get").map(|record| record.size),
            Some(3)
        );
    }
}
