//! Store error types

use rusqlite::ErrorCode;
use thiserror::Error;
use verity_domain::{ErrorKind, Fault};
use verity_gatekeeper::GatekeeperError;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The gatekeeper refused the write
    #[error(transparent)]
    Rejected(#[from] GatekeeperError),

    /// Object not found (or soft-deleted)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Revision names a parent that does not exist
    #[error("Unknown parent: {0}")]
    UnknownParent(String),

    /// Revision would break the lineage chain
    #[error("Lineage violation: {0}")]
    LineageCycle(String),

    /// Write collides with stored state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A previous holder of the connection lock panicked
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl Fault for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Rejected(e) => e.kind(),
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::UnknownParent(_) => ErrorKind::UnknownParent,
            StoreError::LineageCycle(_) => ErrorKind::LineageCycle,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::Database(_)
            | StoreError::Serialization(_)
            | StoreError::InvalidData(_)
            | StoreError::LockPoisoned => ErrorKind::Storage,
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            StoreError::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_is_transient() {
        let busy = StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(busy.is_transient());
        assert_eq!(busy.kind(), ErrorKind::Storage);

        let missing = StoreError::NotFound("claim".to_string());
        assert!(!missing.is_transient());
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_rejection_keeps_gatekeeper_kind() {
        let err = StoreError::from(GatekeeperError::InvalidSignature("bad".to_string()));
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    }
}
