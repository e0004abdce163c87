use super::{DirectorySource, LedgerRepository, apply_update, next_id};
use crate::core::{PersistedActivityRecord, Result, RoleAssignment, SyncError};
use crate::ledger::LedgerRecord;

/// Directory lists and ledger rows held in process memory.
///
/// A role list set to `None` behaves like an unreachable list.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub primary: Option<Vec<RoleAssignment>>,
    pub root: Option<Vec<RoleAssignment>>,
    pub records: Vec<PersistedActivityRecord>,
}

impl MemoryStore {
    pub fn new(primary: Vec<RoleAssignment>, root: Vec<RoleAssignment>) -> Self {
        Self {
            primary: Some(primary),
            root: Some(root),
            records: Vec::new(),
        }
    }

    pub fn with_records(mut self, records: Vec<PersistedActivityRecord>) -> Self {
        self.records = records;
        self
    }
}

impl DirectorySource for MemoryStore {
    fn primary_contacts(&self) -> Result<Vec<RoleAssignment>> {
        self.primary
            .clone()
            .ok_or_else(|| SyncError::DirectoryUnavailable("primary contact list missing".to_string()))
    }

    fn root_contacts(&self) -> Result<Vec<RoleAssignment>> {
        self.root
            .clone()
            .ok_or_else(|| SyncError::DirectoryUnavailable("root contact list missing".to_string()))
    }
}

impl LedgerRepository for MemoryStore {
    fn load_records(&self) -> Result<Vec<PersistedActivityRecord>> {
        Ok(self.records.clone())
    }

    fn insert(&mut self, record: &LedgerRecord) -> Result<u64> {
        let id = next_id(&self.records);
        self.records.push(record.to_persisted(id));
        Ok(id)
    }

    fn update(&mut self, record: &LedgerRecord) -> Result<()> {
        apply_update(&mut self.records, record)
    }
}
