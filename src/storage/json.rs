//! JSON file workspace: one directory holding both contact lists and the ledger.

use super::{DirectorySource, LedgerRepository, apply_update, next_id, row_index, stage_changes};
use crate::core::{PersistedActivityRecord, Result, RoleAssignment, SyncError};
use crate::ledger::{ChangeSet, LedgerRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const PRIMARY_CONTACTS_FILE: &str = "primary_contacts.json";
pub const ROOT_CONTACTS_FILE: &str = "root_contacts.json";
pub const LEDGER_FILE: &str = "ledger.json";

pub struct JsonWorkspace {
    root: PathBuf,
    records: Vec<PersistedActivityRecord>,
}

impl JsonWorkspace {
    /// Open a workspace directory. A missing ledger file is an empty ledger;
    /// an unreadable one is `LedgerUnavailable`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(SyncError::LedgerUnavailable(format!(
                "workspace '{}' is not a directory",
                root.display()
            )));
        }

        let ledger_path = root.join(LEDGER_FILE);
        let records = if ledger_path.exists() {
            read_json(&ledger_path).map_err(|e| {
                SyncError::LedgerUnavailable(format!("{}: {}", ledger_path.display(), e))
            })?
        } else {
            Vec::new()
        };

        Ok(Self { root, records })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn read_contacts(&self, file: &str) -> Result<Vec<RoleAssignment>> {
        let path = self.root.join(file);
        read_json(&path)
            .map_err(|e| SyncError::DirectoryUnavailable(format!("{}: {}", path.display(), e)))
    }

    fn flush(&self) -> Result<()> {
        self.write_ledger(&self.records)
    }

    fn write_ledger(&self, rows: &[PersistedActivityRecord]) -> Result<()> {
        write_json_atomic(&self.root.join(LEDGER_FILE), rows)
            .map_err(|e| SyncError::Persistence(format!("failed to write ledger: {}", e)))
    }
}

impl DirectorySource for JsonWorkspace {
    fn primary_contacts(&self) -> Result<Vec<RoleAssignment>> {
        self.read_contacts(PRIMARY_CONTACTS_FILE)
    }

    fn root_contacts(&self) -> Result<Vec<RoleAssignment>> {
        self.read_contacts(ROOT_CONTACTS_FILE)
    }
}

impl LedgerRepository for JsonWorkspace {
    fn load_records(&self) -> Result<Vec<PersistedActivityRecord>> {
        Ok(self.records.clone())
    }

    fn insert(&mut self, record: &LedgerRecord) -> Result<u64> {
        let id = next_id(&self.records);
        self.records.push(record.to_persisted(id));
        if let Err(err) = self.flush() {
            self.records.pop();
            return Err(err);
        }
        Ok(id)
    }

    fn update(&mut self, record: &LedgerRecord) -> Result<()> {
        let idx = row_index(&self.records, record)?;
        let previous = self.records[idx].clone();
        apply_update(&mut self.records, record)?;
        if let Err(err) = self.flush() {
            self.records[idx] = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Stage the whole change set and rewrite the ledger file once. Nothing
    /// is written, on disk or in memory, unless every record applies.
    fn write_changes(&mut self, changes: &ChangeSet) -> Result<Vec<u64>> {
        let mut staged = self.records.clone();
        let ids = stage_changes(&mut staged, changes)?;
        self.write_ledger(&staged)?;
        self.records = staged;
        Ok(ids)
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write `value` next to `path` and rename it into place.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SyncError::Io(e.error.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures::{changed, fresh, row};
    use tempfile::TempDir;

    /// Workspace holding `rows`, with the ledger file then replaced by a
    /// directory so every later flush fails.
    fn unwritable(dir: &TempDir, rows: Vec<PersistedActivityRecord>) -> JsonWorkspace {
        let ledger = dir.path().join(LEDGER_FILE);
        write_json_atomic(&ledger, &rows).unwrap();
        let workspace = JsonWorkspace::open(dir.path()).unwrap();
        fs::remove_file(&ledger).unwrap();
        fs::create_dir(&ledger).unwrap();
        workspace
    }

    #[test]
    fn test_failed_insert_rolls_back() {
        let dir = TempDir::new().unwrap();
        let mut workspace = unwritable(&dir, vec![row(1, 5)]);

        let err = workspace.insert(&fresh(6)).unwrap_err();
        assert!(matches!(err, SyncError::Persistence(_)));
        assert_eq!(workspace.load_records().unwrap(), vec![row(1, 5)]);
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let dir = TempDir::new().unwrap();
        let mut workspace = unwritable(&dir, vec![row(1, 5)]);

        let err = workspace.update(&changed(row(1, 5))).unwrap_err();
        assert!(matches!(err, SyncError::Persistence(_)));
        assert_eq!(workspace.load_records().unwrap(), vec![row(1, 5)]);
    }

    #[test]
    fn test_update_unknown_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut workspace = JsonWorkspace::open(dir.path()).unwrap();

        let err = workspace.update(&changed(row(9, 5))).unwrap_err();
        assert!(matches!(err, SyncError::Persistence(_)));
        assert!(!dir.path().join(LEDGER_FILE).exists());
    }

    #[test]
    fn test_write_changes_is_all_or_nothing() {
        let dir = TempDir::new().unwrap();
        write_json_atomic(&dir.path().join(LEDGER_FILE), &vec![row(1, 5)]).unwrap();
        let mut workspace = JsonWorkspace::open(dir.path()).unwrap();

        let bad = ChangeSet {
            to_insert: vec![fresh(6)],
            to_update: vec![changed(row(9, 7))],
        };
        assert!(matches!(
            workspace.write_changes(&bad),
            Err(SyncError::Persistence(_))
        ));
        assert_eq!(workspace.load_records().unwrap(), vec![row(1, 5)]);
        let on_disk: Vec<PersistedActivityRecord> = read_json(&dir.path().join(LEDGER_FILE)).unwrap();
        assert_eq!(on_disk, vec![row(1, 5)]);

        let good = ChangeSet {
            to_insert: vec![fresh(6)],
            to_update: vec![changed(row(1, 5))],
        };
        assert_eq!(workspace.write_changes(&good).unwrap(), vec![2]);
        let on_disk: Vec<PersistedActivityRecord> = read_json(&dir.path().join(LEDGER_FILE)).unwrap();
        assert_eq!(on_disk, workspace.load_records().unwrap());
        assert_eq!(on_disk.len(), 2);
    }

    #[test]
    fn test_failed_write_changes_rolls_back() {
        let dir = TempDir::new().unwrap();
        let mut workspace = unwritable(&dir, vec![row(1, 5)]);
        let changes = ChangeSet {
            to_insert: vec![fresh(6)],
            to_update: vec![changed(row(1, 5))],
        };

        assert!(workspace.write_changes(&changes).is_err());
        assert_eq!(workspace.load_records().unwrap(), vec![row(1, 5)]);
    }

    #[test]
    fn test_open_missing_directory() {
        let err = JsonWorkspace::open("/nonexistent/activity-sync").err().unwrap();
        assert!(matches!(err, SyncError::LedgerUnavailable(_)));
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = TempDir::new().unwrap();
        let workspace = JsonWorkspace::open(dir.path()).unwrap();
        assert!(workspace.load_records().unwrap().is_empty());
    }

    #[test]
    fn test_missing_contacts_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let workspace = JsonWorkspace::open(dir.path()).unwrap();
        assert!(matches!(
            workspace.primary_contacts(),
            Err(SyncError::DirectoryUnavailable(_))
        ));
    }

    #[test]
    fn test_corrupt_ledger_is_unavailable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LEDGER_FILE), "{not json").unwrap();
        let err = JsonWorkspace::open(dir.path()).err().unwrap();
        assert!(matches!(err, SyncError::LedgerUnavailable(_)));
    }

    #[test]
    fn test_write_json_atomic_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.json");

        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        write_json_atomic(&path, &vec![4]).unwrap();

        let values: Vec<u32> = read_json(&path).unwrap();
        assert_eq!(values, vec![4]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
