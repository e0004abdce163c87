use super::record::LedgerRecord;
use serde::Serialize;

/// Dirty ledger records, split by whether storage already holds them.
///
/// Both lists are ordered by ledger key so repeated runs write in a stable
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub to_insert: Vec<LedgerRecord>,
    pub to_update: Vec<LedgerRecord>,
}

impl ChangeSet {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = LedgerRecord>,
    {
        let (mut to_insert, mut to_update): (Vec<_>, Vec<_>) = records
            .into_iter()
            .filter(LedgerRecord::is_dirty)
            .partition(LedgerRecord::is_new);

        to_insert.sort_by_key(|record| *record.key());
        to_update.sort_by_key(|record| *record.key());

        Self {
            to_insert,
            to_update,
        }
    }

    pub fn len(&self) -> usize {
        self.to_insert.len() + self.to_update.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty()
    }
}
