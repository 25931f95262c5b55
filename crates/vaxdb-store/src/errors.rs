//! Error handling for vaxdb-store
//!
//! Wraps vaxdb-core StoreError with store-specific helpers

use vaxdb_core::StoreError;

/// Result type alias using StoreError
pub type Result<T> = vaxdb_core::Result<T>;

/// Create a persistence error from rusqlite::Error
pub fn from_rusqlite(op: &'static str, err: rusqlite::Error) -> StoreError {
    StoreError::Persistence {
        op,
        reason: err.to_string(),
    }
}

/// Create a storage-unavailable error (open/configure failures)
pub fn storage_unavailable(err: rusqlite::Error) -> StoreError {
    StoreError::StorageUnavailable {
        reason: err.to_string(),
    }
}

/// True when the error is a primary-key or uniqueness violation
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
