// ============================================================================
// Activity Sync Library
// ============================================================================

//! Reconciles collected activity events (commits, mentoring sessions) with a
//! per-person, per-month activity ledger and produces the inserts and updates
//! needed to bring the ledger up to date.
//!
//! ```
//! use activity_sync::{IncomingEvent, RoleAssignment, SyncConfig, NoopObserver, reconcile};
//! use chrono::NaiveDate;
//!
//! let primary = vec![RoleAssignment::new(1, Some("a@x"))];
//! let mut events = vec![IncomingEvent::for_email(
//!     "a@x",
//!     NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
//!     "Dev",
//! )];
//!
//! let (changes, stats) = reconcile(
//!     Vec::new(),
//!     primary,
//!     Vec::new(),
//!     &mut events,
//!     &SyncConfig::default(),
//!     &NoopObserver,
//! )
//! .unwrap();
//!
//! assert_eq!(stats.created, 1);
//! assert_eq!(changes.to_insert.len(), 1);
//! ```

pub mod collect;
pub mod config;
pub mod core;
pub mod delivery;
pub mod directory;
pub mod ledger;
pub mod observer;
pub mod resolver;
pub mod service;
pub mod storage;

pub use config::{EmailMatching, SeedKeyOrder, SyncConfig};
pub use crate::core::{
    IncomingEvent, LedgerKey, PersistedActivityRecord, PersonId, Result, RoleAssignment, SyncError,
};
pub use delivery::{DeliveryRetryPolicy, EventSink, HttpEventSink};
pub use directory::{Person, PersonDirectory};
pub use ledger::{ChangeSet, LedgerRecord, LedgerStore, MergeEngine, MergeOutcome, MergeStats};
pub use observer::{LogObserver, NoopObserver, SyncObserver};
pub use resolver::{EventResolver, Resolution, UnresolvedReason};
pub use service::{SyncReport, SyncService, reconcile};
pub use storage::{DirectorySource, JsonWorkspace, LedgerRepository, MemoryStore};
