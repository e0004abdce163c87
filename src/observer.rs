//! Diagnostics hooks for the reconciliation pass.
//!
//! Components take a `&dyn SyncObserver` when they are built instead of
//! reaching for a global logger. Every callback has an empty default body, so
//! an observer only overrides what it cares about.

use crate::core::{IncomingEvent, LedgerKey};
use crate::resolver::UnresolvedReason;
use log::{debug, info, warn};

pub trait SyncObserver {
    /// The directory was unified from both role lists.
    fn directory_built(&self, _persons: usize) {}

    /// The store was seeded from persisted records.
    fn store_seeded(&self, _records: usize) {}

    /// An event could not be attributed to a known person and was skipped.
    fn event_dropped(&self, _event: &IncomingEvent, _reason: &UnresolvedReason) {}

    /// A new ledger record was created for `key`.
    fn record_created(&self, _key: &LedgerKey) {}

    /// An existing ledger record gained activity types or paths.
    fn record_changed(&self, _key: &LedgerKey) {}

    /// A resolved event had no directory entry to build a record from.
    fn unmergeable(&self, _key: &LedgerKey) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

/// Observer that forwards callbacks to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SyncObserver for LogObserver {
    fn directory_built(&self, persons: usize) {
        info!("contact directory built: persons={}", persons);
    }

    fn store_seeded(&self, records: usize) {
        info!("ledger store seeded: records={}", records);
    }

    fn event_dropped(&self, event: &IncomingEvent, reason: &UnresolvedReason) {
        debug!(
            "activity event dropped: activity='{}' date={} reason='{}'",
            event.activity, event.date, reason
        );
    }

    fn record_created(&self, key: &LedgerKey) {
        debug!("ledger record created: key={}", key);
    }

    fn record_changed(&self, key: &LedgerKey) {
        debug!("ledger record changed: key={}", key);
    }

    fn unmergeable(&self, key: &LedgerKey) {
        warn!(
            "resolved activity has no directory entry, skipping: key={}",
            key
        );
    }
}
