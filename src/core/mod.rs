pub mod error;
pub mod types;

pub use error::{Result, SyncError};
pub use types::{IncomingEvent, LedgerKey, PersistedActivityRecord, PersonId, RoleAssignment};
