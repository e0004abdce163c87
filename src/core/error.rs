use thiserror::Error;

use super::types::LedgerKey;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Contact directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Activity ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Duplicate ledger key {key} in persisted records {first} and {second}")]
    DuplicateLedgerKey { key: LedgerKey, first: u64, second: u64 },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Source control error: {0}")]
    SourceControl(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
