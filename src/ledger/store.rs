use super::changeset::ChangeSet;
use super::record::LedgerRecord;
use crate::config::{EmailMatching, SeedKeyOrder};
use crate::core::{IncomingEvent, LedgerKey, PersistedActivityRecord, PersonId, Result, SyncError};
use crate::directory::PersonDirectory;
use crate::observer::SyncObserver;
use crate::resolver::{EventResolver, Resolution};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// In-memory projection of the activity ledger for one run.
#[derive(Debug, Default)]
pub struct LedgerStore {
    records: HashMap<LedgerKey, LedgerRecord>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store from persisted rows.
    ///
    /// Each row is keyed by the contact identity `order` picks first, or by
    /// `PersonId::UNKNOWN` when it has neither contact. Two rows landing on
    /// one key is a storage integrity problem and aborts the seed.
    pub fn seed<I>(records: I, order: SeedKeyOrder) -> Result<Self>
    where
        I: IntoIterator<Item = PersistedActivityRecord>,
    {
        let mut store = Self::new();

        for record in records {
            let person = seed_identity(&record, order);
            let key = LedgerKey::new(person, record.year, record.month);

            match store.records.entry(key) {
                Entry::Occupied(existing) => {
                    return Err(SyncError::DuplicateLedgerKey {
                        key,
                        first: existing.get().persisted_id().unwrap_or_default(),
                        second: record.persisted_id,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(LedgerRecord::from_persisted(key, record));
                }
            }
        }

        Ok(store)
    }

    pub fn get(&self, key: &LedgerKey) -> Option<&LedgerRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &LedgerKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &LedgerRecord> {
        self.records.values()
    }

    pub fn dirty_count(&self) -> usize {
        self.records.values().filter(|record| record.is_dirty()).count()
    }

    /// Split dirty records into inserts and updates, consuming the store.
    pub fn into_change_set(self) -> ChangeSet {
        ChangeSet::from_records(self.records.into_values())
    }
}

fn seed_identity(record: &PersistedActivityRecord, order: SeedKeyOrder) -> PersonId {
    let preferred = match order {
        SeedKeyOrder::RootThenPrimary => record.root_contact.or(record.primary_contact),
        SeedKeyOrder::PrimaryThenRoot => record.primary_contact.or(record.root_contact),
    };
    preferred.unwrap_or(PersonId::UNKNOWN)
}

/// What a single event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created(LedgerKey),
    Updated(LedgerKey),
    Unchanged(LedgerKey),
    /// The event was resolved but the directory had no person to build a
    /// record from.
    Unmergeable(LedgerKey),
    Unresolved,
}

/// Counters for one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub events: usize,
    pub resolved: usize,
    pub dropped: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub unmergeable: usize,
}

impl MergeStats {
    fn record(&mut self, outcome: &MergeOutcome) {
        self.events += 1;
        match outcome {
            MergeOutcome::Created(_) => self.created += 1,
            MergeOutcome::Updated(_) => self.updated += 1,
            MergeOutcome::Unchanged(_) => self.unchanged += 1,
            MergeOutcome::Unmergeable(_) => self.unmergeable += 1,
            MergeOutcome::Unresolved => self.dropped += 1,
        }
        if !matches!(outcome, MergeOutcome::Unresolved) {
            self.resolved += 1;
        }
    }
}

/// Folds resolved events into a `LedgerStore`.
///
/// All mutation of ledger records goes through `upsert`; one engine applies
/// events serially so key uniqueness and monotone growth hold by construction.
pub struct MergeEngine<'a> {
    directory: &'a PersonDirectory,
    resolver: EventResolver<'a>,
    observer: &'a dyn SyncObserver,
}

impl<'a> MergeEngine<'a> {
    pub fn new(
        directory: &'a PersonDirectory,
        matching: EmailMatching,
        observer: &'a dyn SyncObserver,
    ) -> Self {
        Self {
            directory,
            resolver: EventResolver::new(directory, matching, observer),
            observer,
        }
    }

    pub fn merge<'e, I>(&self, store: &mut LedgerStore, events: I) -> MergeStats
    where
        I: IntoIterator<Item = &'e mut IncomingEvent>,
    {
        let mut stats = MergeStats::default();
        for event in events {
            let outcome = self.upsert(store, event);
            stats.record(&outcome);
        }
        stats
    }

    /// Resolve one event and apply it to its ledger record.
    pub fn upsert(&self, store: &mut LedgerStore, event: &mut IncomingEvent) -> MergeOutcome {
        let person = match self.resolver.resolve(event) {
            Resolution::Resolved(person) => person,
            Resolution::Unresolved(_) => return MergeOutcome::Unresolved,
        };
        let key = LedgerKey::for_date(person, event.date);

        match store.records.entry(key) {
            Entry::Occupied(mut slot) => {
                if slot.get_mut().absorb(event) {
                    self.observer.record_changed(&key);
                    MergeOutcome::Updated(key)
                } else {
                    MergeOutcome::Unchanged(key)
                }
            }
            Entry::Vacant(slot) => match self.directory.get(person) {
                Some(owner) => {
                    slot.insert(LedgerRecord::from_event(key, event, owner));
                    self.observer.record_created(&key);
                    MergeOutcome::Created(key)
                }
                None => {
                    self.observer.unmergeable(&key);
                    MergeOutcome::Unmergeable(key)
                }
            },
        }
    }
}
