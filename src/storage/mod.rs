//! Storage collaborators: contact directories and the persisted ledger.
//!
//! Every call is synchronous and all-or-nothing. Failures propagate as
//! `SyncError` and abort the run; nothing here retries.

pub mod json;
pub mod memory;

pub use json::JsonWorkspace;
pub use memory::MemoryStore;

use crate::core::{PersistedActivityRecord, Result, RoleAssignment, SyncError};
use crate::ledger::{ChangeSet, LedgerRecord};

/// Source of both contact role lists.
pub trait DirectorySource {
    fn primary_contacts(&self) -> Result<Vec<RoleAssignment>>;

    fn root_contacts(&self) -> Result<Vec<RoleAssignment>>;
}

/// Persisted activity ledger.
pub trait LedgerRepository {
    fn load_records(&self) -> Result<Vec<PersistedActivityRecord>>;

    /// Store a new record and return its assigned identifier.
    fn insert(&mut self, record: &LedgerRecord) -> Result<u64>;

    /// Overwrite the activity types and paths of an existing record.
    fn update(&mut self, record: &LedgerRecord) -> Result<()>;

    /// Write a whole change set and return the ids assigned to `to_insert`,
    /// in order.
    ///
    /// The default writes record by record, so a failure part way through
    /// leaves the earlier records stored. Backends that can stage the batch
    /// override this to make it all-or-nothing.
    fn write_changes(&mut self, changes: &ChangeSet) -> Result<Vec<u64>> {
        let mut ids = Vec::with_capacity(changes.to_insert.len());
        for record in &changes.to_insert {
            ids.push(self.insert(record)?);
        }
        for record in &changes.to_update {
            self.update(record)?;
        }
        Ok(ids)
    }
}

/// Position of the stored row `record` updates.
pub(crate) fn row_index(rows: &[PersistedActivityRecord], record: &LedgerRecord) -> Result<usize> {
    let id = record.persisted_id().ok_or_else(|| {
        SyncError::Persistence(format!(
            "record {} has no persisted id to update",
            record.key()
        ))
    })?;

    rows.iter()
        .position(|row| row.persisted_id == id)
        .ok_or_else(|| SyncError::Persistence(format!("persisted record {} not found", id)))
}

/// Apply an update to an in-memory row list. Shared by the store backends.
pub(crate) fn apply_update(
    rows: &mut [PersistedActivityRecord],
    record: &LedgerRecord,
) -> Result<()> {
    let idx = row_index(rows, record)?;
    rows[idx].activity_types = record.activity_types().clone();
    rows[idx].paths = record.paths().clone();
    Ok(())
}

/// Apply a whole change set to `rows`, assigning ids to new records.
pub(crate) fn stage_changes(
    rows: &mut Vec<PersistedActivityRecord>,
    changes: &ChangeSet,
) -> Result<Vec<u64>> {
    let mut ids = Vec::with_capacity(changes.to_insert.len());
    for record in &changes.to_insert {
        let id = next_id(rows);
        rows.push(record.to_persisted(id));
        ids.push(id);
    }
    for record in &changes.to_update {
        apply_update(rows, record)?;
    }
    Ok(ids)
}

pub(crate) fn next_id(rows: &[PersistedActivityRecord]) -> u64 {
    rows.iter().map(|row| row.persisted_id).max().unwrap_or(0) + 1
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::core::{IncomingEvent, LedgerKey, PersistedActivityRecord, PersonId};
    use crate::directory::{ContactRole, Person};
    use crate::ledger::LedgerRecord;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    pub fn row(persisted_id: u64, month: u32) -> PersistedActivityRecord {
        PersistedActivityRecord {
            persisted_id,
            root_contact: None,
            primary_contact: Some(PersonId(1)),
            year: 2024,
            month,
            activity_types: BTreeSet::from(["Dev".to_string()]),
            paths: BTreeSet::new(),
        }
    }

    fn review(month: u32) -> IncomingEvent {
        IncomingEvent::for_person(1, NaiveDate::from_ymd_opt(2024, month, 3).unwrap(), "Review")
    }

    /// Stored row with one more activity type, ready to update.
    pub fn changed(row: PersistedActivityRecord) -> LedgerRecord {
        let month = row.month;
        let mut record = LedgerRecord::from_persisted(LedgerKey::new(PersonId(1), 2024, month), row);
        assert!(record.absorb(&review(month)));
        record
    }

    /// Record for `month` that storage has never seen.
    pub fn fresh(month: u32) -> LedgerRecord {
        let person = Person {
            id: PersonId(1),
            primary: Some(ContactRole::default()),
            root: None,
        };
        LedgerRecord::from_event(LedgerKey::new(PersonId(1), 2024, month), &review(month), &person)
    }
}
