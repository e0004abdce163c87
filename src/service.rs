//! One reconciliation run from collaborator fetch to write-back.

use crate::config::SyncConfig;
use crate::core::{IncomingEvent, PersistedActivityRecord, Result, RoleAssignment};
use crate::directory::PersonDirectory;
use crate::ledger::{ChangeSet, LedgerStore, MergeEngine, MergeStats};
use crate::observer::{NoopObserver, SyncObserver};
use crate::storage::{DirectorySource, LedgerRepository};
use tracing::{info, info_span};

/// Outcome of a completed run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub persons: usize,
    pub seeded: usize,
    pub stats: MergeStats,
    pub changes: ChangeSet,
    /// Identifiers assigned to `changes.to_insert`, in the same order.
    /// Empty on a dry run.
    pub inserted_ids: Vec<u64>,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn inserted(&self) -> usize {
        self.changes.to_insert.len()
    }

    pub fn updated(&self) -> usize {
        self.changes.to_update.len()
    }
}

/// Merge `events` into the ledger described by `records`.
///
/// Pure core of a run: no collaborator is touched and nothing is returned
/// unless the whole merge completed.
pub fn reconcile(
    records: Vec<PersistedActivityRecord>,
    primary: Vec<RoleAssignment>,
    root: Vec<RoleAssignment>,
    events: &mut [IncomingEvent],
    config: &SyncConfig,
    observer: &dyn SyncObserver,
) -> Result<(ChangeSet, MergeStats)> {
    let directory = PersonDirectory::build(primary, root);
    observer.directory_built(directory.len());
    merge_records(records, &directory, events, config, observer)
}

fn merge_records(
    records: Vec<PersistedActivityRecord>,
    directory: &PersonDirectory,
    events: &mut [IncomingEvent],
    config: &SyncConfig,
    observer: &dyn SyncObserver,
) -> Result<(ChangeSet, MergeStats)> {
    let mut store = LedgerStore::seed(records, config.seed_key_order)?;
    observer.store_seeded(store.len());

    let engine = MergeEngine::new(directory, config.email_matching, observer);
    let stats = engine.merge(&mut store, events.iter_mut());

    Ok((store.into_change_set(), stats))
}

pub struct SyncService<'a> {
    config: SyncConfig,
    observer: &'a dyn SyncObserver,
}

impl SyncService<'static> {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            observer: &NoopObserver,
        }
    }
}

impl<'a> SyncService<'a> {
    pub fn with_observer(config: SyncConfig, observer: &'a dyn SyncObserver) -> Self {
        Self { config, observer }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Fetch, merge and write back.
    ///
    /// Any collaborator failure aborts the run. Fetch and merge failures
    /// happen before the first write, so storage is left untouched.
    pub fn run<D, L>(
        &self,
        directory: &D,
        ledger: &mut L,
        events: Vec<IncomingEvent>,
    ) -> Result<SyncReport>
    where
        D: DirectorySource + ?Sized,
        L: LedgerRepository + ?Sized,
    {
        let primary = directory.primary_contacts()?;
        let root = directory.root_contacts()?;
        self.apply(primary, root, ledger, events)
    }

    /// `run` against a backend that serves both the directory and the ledger.
    pub fn run_on<S>(&self, store: &mut S, events: Vec<IncomingEvent>) -> Result<SyncReport>
    where
        S: DirectorySource + LedgerRepository + ?Sized,
    {
        let primary = store.primary_contacts()?;
        let root = store.root_contacts()?;
        self.apply(primary, root, store, events)
    }

    fn apply<L>(
        &self,
        primary: Vec<RoleAssignment>,
        root: Vec<RoleAssignment>,
        ledger: &mut L,
        mut events: Vec<IncomingEvent>,
    ) -> Result<SyncReport>
    where
        L: LedgerRepository + ?Sized,
    {
        let span = info_span!("sync_run", events = events.len(), dry_run = self.config.dry_run);
        let _guard = span.enter();

        let persons = PersonDirectory::build(primary, root);
        self.observer.directory_built(persons.len());

        let records = ledger.load_records()?;
        let seeded = records.len();

        let (changes, stats) =
            merge_records(records, &persons, &mut events, &self.config, self.observer)?;
        info!(
            resolved = stats.resolved,
            dropped = stats.dropped,
            inserts = changes.to_insert.len(),
            updates = changes.to_update.len(),
            "merge complete"
        );

        let inserted_ids = if self.config.dry_run {
            Vec::new()
        } else {
            let ids = ledger.write_changes(&changes)?;
            info!(
                inserted = ids.len(),
                updated = changes.to_update.len(),
                "ledger written"
            );
            ids
        };

        Ok(SyncReport {
            persons: persons.len(),
            seeded,
            stats,
            changes,
            inserted_ids,
            dry_run: self.config.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PersonId, SyncError};
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn store() -> MemoryStore {
        MemoryStore::new(vec![RoleAssignment::new(1, Some("a@x"))], Vec::new())
    }

    fn event() -> IncomingEvent {
        IncomingEvent::for_email("a@x", NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), "Dev")
    }

    #[test]
    fn test_run_inserts_new_record() {
        let mut store = store();
        let directory = store.clone();
        let report = SyncService::new(SyncConfig::default())
            .run(&directory, &mut store, vec![event()])
            .unwrap();

        assert_eq!(report.persons, 1);
        assert_eq!(report.inserted(), 1);
        assert_eq!(report.inserted_ids, vec![1]);
        assert_eq!(store.records.len(), 1);
        assert_eq!(store.records[0].primary_contact, Some(PersonId(1)));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut store = store();
        let directory = store.clone();
        let report = SyncService::new(SyncConfig::default().dry_run(true))
            .run(&directory, &mut store, vec![event()])
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.inserted(), 1);
        assert!(report.inserted_ids.is_empty());
        assert!(store.records.is_empty());
    }

    #[test]
    fn test_missing_directory_aborts_before_write() {
        let mut store = store();
        let mut directory = store.clone();
        directory.primary = None;

        let err = SyncService::new(SyncConfig::default())
            .run(&directory, &mut store, vec![event()])
            .unwrap_err();

        assert!(matches!(err, SyncError::DirectoryUnavailable(_)));
        assert!(store.records.is_empty());
    }

    #[test]
    fn test_run_on_single_backend() {
        let mut store = store();
        let report = SyncService::new(SyncConfig::default())
            .run_on(&mut store, vec![event(), event()])
            .unwrap();

        assert_eq!(report.stats.events, 2);
        assert_eq!(report.stats.created, 1);
        assert_eq!(report.stats.unchanged, 1);
        assert_eq!(store.records.len(), 1);
    }
}
