//! In-process store used by tests and throwaway servers.

use std::sync::{Mutex, MutexGuard};

use site_contract::{CommandLogRecord, LeadRecord, SessionRecord};

use super::{FileRecord, NewLead, SiteStore, StoreError, ADMIN_LIST_LIMIT};

#[derive(Default)]
struct MemoryTables {
    sessions: Vec<SessionRecord>,
    logs: Vec<CommandLogRecord>,
    files: Vec<FileRecord>,
    leads: Vec<LeadRecord>,
    file_insert_limit: Option<usize>,
}

/// [`SiteStore`] held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects file inserts once `count` records have been stored.
    pub fn fail_file_inserts_after(&self, count: usize) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.file_insert_limit = Some(count);
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, MemoryTables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn newest_first<T: Clone>(rows: &[T]) -> Vec<T> {
    rows.iter().rev().take(ADMIN_LIST_LIMIT).cloned().collect()
}

impl SiteStore for MemoryStore {
    fn create_session(&self, id: &str, created_at: &str) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if !tables.sessions.iter().any(|session| session.id == id) {
            tables.sessions.push(SessionRecord {
                id: id.to_string(),
                created_at: created_at.to_string(),
            });
        }
        Ok(())
    }

    fn log_command(
        &self,
        session_id: &str,
        command: &str,
        timestamp: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let id = tables.logs.len() as i64 + 1;
        tables.logs.push(CommandLogRecord {
            id,
            session_id: session_id.to_string(),
            command: command.to_string(),
            timestamp: timestamp.to_string(),
        });
        Ok(())
    }

    fn insert_file(&self, record: &FileRecord) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables
            .file_insert_limit
            .is_some_and(|limit| tables.files.len() >= limit)
        {
            return Err(StoreError::Rejected("file table is full"));
        }
        tables.files.push(record.clone());
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        let mut files = self.tables()?.files.clone();
        files.reverse();
        files.sort_by(|left, right| right.uploaded_at.cmp(&left.uploaded_at));
        Ok(files)
    }

    fn get_file(&self, id: &str) -> Result<Option<FileRecord>, StoreError> {
        Ok(self
            .tables()?
            .files
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    fn find_file_by_blob_path(&self, blob_path: &str) -> Result<Option<FileRecord>, StoreError> {
        Ok(self
            .tables()?
            .files
            .iter()
            .find(|record| record.blob_path == blob_path)
            .cloned())
    }

    fn delete_file(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.files.len();
        tables.files.retain(|record| record.id != id);
        Ok(tables.files.len() != before)
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<i64, StoreError> {
        let mut tables = self.tables()?;
        let id = tables.leads.len() as i64 + 1;
        tables.leads.push(LeadRecord {
            id,
            session_id: lead.session_id.clone(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            company: lead.company.clone(),
            project_type: lead.project_type.clone(),
            budget: lead.budget.clone(),
            created_at: lead.created_at.clone(),
        });
        Ok(id)
    }

    fn list_leads(&self) -> Result<Vec<LeadRecord>, StoreError> {
        Ok(newest_first(&self.tables()?.leads))
    }

    fn list_command_logs(&self) -> Result<Vec<CommandLogRecord>, StoreError> {
        Ok(newest_first(&self.tables()?.logs))
    }

    fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(newest_first(&self.tables()?.sessions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    #[test]
    fn sessions_ignore_duplicates() {
        contract::sessions_ignore_duplicates(&MemoryStore::new());
    }

    #[test]
    fn files_list_newest_first_and_delete() {
        contract::files_list_newest_first_and_delete(&MemoryStore::new());
    }

    #[test]
    fn leads_and_logs_round_trip() {
        contract::leads_and_logs_round_trip(&MemoryStore::new());
    }

    #[test]
    fn injected_insert_limit_rejects_files() {
        let store = MemoryStore::new();
        store.fail_file_inserts_after(1);
        store
            .insert_file(&contract::file("a", "2024-01-01T00:00:00.000Z"))
            .expect("first");
        assert!(matches!(
            store.insert_file(&contract::file("b", "2024-01-01T00:00:00.000Z")),
            Err(StoreError::Rejected(_))
        ));
        assert_eq!(store.list_files().expect("list").len(), 1);
    }
}
