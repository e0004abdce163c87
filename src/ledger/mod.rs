//! The per-run ledger projection: seeding, merging and change extraction.

pub mod changeset;
pub mod record;
pub mod store;

pub use changeset::ChangeSet;
pub use record::LedgerRecord;
pub use store::{LedgerStore, MergeEngine, MergeOutcome, MergeStats};
