//! Persistence for sessions, command logs, file records, and leads.

mod memory;
mod sqlite;

use chrono::{SecondsFormat, Utc};
use site_contract::{CommandLogRecord, LeadRecord, SessionRecord};
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Maximum rows returned by admin listings.
pub const ADMIN_LIST_LIMIT: usize = 100;

/// Storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite reported an error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
    /// The backend refused the write.
    #[error("write rejected: {0}")]
    Rejected(&'static str),
}

/// Stored upload metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Record identifier (UUID v4).
    pub id: String,
    /// Uploading session.
    pub session_id: String,
    /// Original client file name.
    pub filename: String,
    /// Key of the bytes in the blob store.
    pub blob_path: String,
    /// Reported MIME type.
    pub mimetype: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload timestamp.
    pub uploaded_at: String,
}

/// Validated lead ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    /// Submitting session, when known.
    pub session_id: Option<String>,
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Company name.
    pub company: String,
    /// Requested project type.
    pub project_type: Option<String>,
    /// Budget bracket.
    pub budget: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Current time as a fixed-width, lexically sortable RFC 3339 UTC string.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Storage backend shared by request handlers.
///
/// Listings return newest rows first.
pub trait SiteStore: Send + Sync {
    /// Records a session; an existing id is left untouched.
    fn create_session(&self, id: &str, created_at: &str) -> Result<(), StoreError>;

    /// Appends one tracked command.
    fn log_command(
        &self,
        session_id: &str,
        command: &str,
        timestamp: &str,
    ) -> Result<(), StoreError>;

    /// Stores a completed upload.
    fn insert_file(&self, record: &FileRecord) -> Result<(), StoreError>;

    /// Lists every stored file.
    fn list_files(&self) -> Result<Vec<FileRecord>, StoreError>;

    /// Fetches one file record.
    fn get_file(&self, id: &str) -> Result<Option<FileRecord>, StoreError>;

    /// Fetches the file record whose bytes live under `blob_path`.
    fn find_file_by_blob_path(&self, blob_path: &str) -> Result<Option<FileRecord>, StoreError>;

    /// Deletes one file record, returning whether it existed.
    fn delete_file(&self, id: &str) -> Result<bool, StoreError>;

    /// Stores a lead and returns its id.
    fn insert_lead(&self, lead: &NewLead) -> Result<i64, StoreError>;

    /// Lists recent leads.
    fn list_leads(&self) -> Result<Vec<LeadRecord>, StoreError>;

    /// Lists recent tracked commands.
    fn list_command_logs(&self) -> Result<Vec<CommandLogRecord>, StoreError>;

    /// Lists recent sessions.
    fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_fixed_width_utc() {
        let stamp = now_timestamp();
        assert_eq!(stamp.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(stamp.ends_with('Z'));
    }
}
