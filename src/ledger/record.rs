use crate::core::{IncomingEvent, LedgerKey, PersistedActivityRecord, PersonId};
use crate::directory::Person;
use serde::Serialize;
use std::collections::BTreeSet;

/// Per-person, per-month aggregate of activity types and paths.
///
/// Both sets only grow and `dirty` is never cleared, so a record that changed
/// once during a run is written back even if later events add nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRecord {
    key: LedgerKey,
    persisted_id: Option<u64>,
    primary_contact: Option<PersonId>,
    root_contact: Option<PersonId>,
    activity_types: BTreeSet<String>,
    paths: BTreeSet<String>,
    dirty: bool,
}

impl LedgerRecord {
    /// Clean record loaded from storage.
    pub(crate) fn from_persisted(key: LedgerKey, record: PersistedActivityRecord) -> Self {
        Self {
            key,
            persisted_id: Some(record.persisted_id),
            primary_contact: record.primary_contact,
            root_contact: record.root_contact,
            activity_types: record.activity_types,
            paths: record.paths,
            dirty: false,
        }
    }

    /// New record built from the first event seen for `key`. Always dirty.
    pub(crate) fn from_event(key: LedgerKey, event: &IncomingEvent, person: &Person) -> Self {
        Self {
            key,
            persisted_id: None,
            primary_contact: person.primary_contact(),
            root_contact: person.root_contact(),
            activity_types: BTreeSet::from([event.activity.clone()]),
            paths: event.paths.clone(),
            dirty: true,
        }
    }

    /// Union the event's activity type and paths into this record.
    /// Returns whether anything was added.
    pub(crate) fn absorb(&mut self, event: &IncomingEvent) -> bool {
        let mut changed = false;

        if !self.activity_types.contains(&event.activity) {
            self.activity_types.insert(event.activity.clone());
            changed = true;
        }

        for path in event.paths.difference(&self.paths).cloned().collect::<Vec<_>>() {
            self.paths.insert(path);
            changed = true;
        }

        if changed {
            self.dirty = true;
        }
        changed
    }

    pub fn key(&self) -> &LedgerKey {
        &self.key
    }

    pub fn year(&self) -> i32 {
        self.key.year
    }

    pub fn month(&self) -> u32 {
        self.key.month
    }

    pub fn persisted_id(&self) -> Option<u64> {
        self.persisted_id
    }

    pub fn is_new(&self) -> bool {
        self.persisted_id.is_none()
    }

    pub fn primary_contact(&self) -> Option<PersonId> {
        self.primary_contact
    }

    pub fn root_contact(&self) -> Option<PersonId> {
        self.root_contact
    }

    pub fn activity_types(&self) -> &BTreeSet<String> {
        &self.activity_types
    }

    pub fn paths(&self) -> &BTreeSet<String> {
        &self.paths
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Storage shape of this record once it has been assigned `persisted_id`.
    pub fn to_persisted(&self, persisted_id: u64) -> PersistedActivityRecord {
        PersistedActivityRecord {
            persisted_id,
            root_contact: self.root_contact,
            primary_contact: self.primary_contact,
            year: self.key.year,
            month: self.key.month,
            activity_types: self.activity_types.clone(),
            paths: self.paths.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PersonId;
    use chrono::NaiveDate;

    fn persisted() -> LedgerRecord {
        LedgerRecord::from_persisted(
            LedgerKey::new(PersonId(1), 2024, 5),
            PersistedActivityRecord {
                persisted_id: 10,
                root_contact: None,
                primary_contact: Some(PersonId(1)),
                year: 2024,
                month: 5,
                activity_types: BTreeSet::from(["Dev".to_string()]),
                paths: BTreeSet::from(["Backend".to_string()]),
            },
        )
    }

    fn event(activity: &str, paths: &[&str]) -> IncomingEvent {
        IncomingEvent::for_person(1, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(), activity)
            .with_paths(paths.iter().copied())
    }

    #[test]
    fn test_persisted_record_starts_clean() {
        let record = persisted();
        assert!(!record.is_dirty());
        assert!(!record.is_new());
        assert_eq!(record.persisted_id(), Some(10));
    }

    #[test]
    fn test_absorb_known_content_is_noop() {
        let mut record = persisted();
        assert!(!record.absorb(&event("Dev", &["Backend"])));
        assert!(!record.is_dirty());
    }

    #[test]
    fn test_absorb_new_path_only() {
        let mut record = persisted();
        assert!(record.absorb(&event("Dev", &["Backend", "Frontend"])));
        assert!(record.is_dirty());
        assert_eq!(record.activity_types().len(), 1);
        assert_eq!(record.paths().len(), 2);
    }

    #[test]
    fn test_dirty_survives_later_noop() {
        let mut record = persisted();
        record.absorb(&event("Mentoring", &[]));
        assert!(!record.absorb(&event("Mentoring", &[])));
        assert!(record.is_dirty());
    }

    #[test]
    fn test_to_persisted_carries_full_sets() {
        let mut record = persisted();
        record.absorb(&event("Mentoring", &["Frontend"]));
        let row = record.to_persisted(10);
        assert_eq!(row.year, 2024);
        assert_eq!(row.month, 5);
        assert_eq!(row.activity_types.len(), 2);
        assert_eq!(row.paths.len(), 2);
    }
}
