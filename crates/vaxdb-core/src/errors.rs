//! Error taxonomy for VaxDB store operations
//!
//! `NotFound`, `DuplicateKey` and `UnsupportedQuery` are caller-recoverable;
//! `MigrationFailed` and `StorageUnavailable` are fatal at open time and the
//! application should degrade to a "local storage unavailable" state.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Canonical error type for all store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Point lookup or update hit a missing primary key
    #[error("Record not found in {collection}: {key}")]
    NotFound {
        collection: &'static str,
        key: String,
    },

    /// `add` with a caller-supplied primary key that already exists
    #[error("Duplicate key in {collection}: {key}")]
    DuplicateKey {
        collection: &'static str,
        key: String,
    },

    /// Query against a field the current schema does not index
    #[error("Field '{field}' is not indexed on {collection}")]
    UnsupportedQuery {
        collection: &'static str,
        field: String,
    },

    /// Schema migration could not complete; the store must not be used
    #[error("Migration to schema version {version} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },

    /// The underlying storage engine is inaccessible
    #[error("Local storage unavailable: {reason}")]
    StorageUnavailable { reason: String },

    /// A record failed to encode or decode at the storage boundary
    #[error("Invalid {collection} record: {reason}")]
    InvalidRecord {
        collection: &'static str,
        reason: String,
    },

    /// A storage engine operation failed mid-flight
    #[error("Storage operation '{op}' failed: {reason}")]
    Persistence { op: &'static str, reason: String },
}

impl StoreError {
    /// Create a not-found error
    pub fn not_found(collection: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            collection,
            key: key.to_string(),
        }
    }

    /// Create a duplicate-key error
    pub fn duplicate_key(collection: &'static str, key: impl ToString) -> Self {
        Self::DuplicateKey {
            collection,
            key: key.to_string(),
        }
    }

    /// Create an unsupported-query error
    pub fn unsupported_query(collection: &'static str, field: impl Into<String>) -> Self {
        Self::UnsupportedQuery {
            collection,
            field: field.into(),
        }
    }

    /// Create a migration-failed error
    pub fn migration_failed(version: u32, reason: impl Into<String>) -> Self {
        Self::MigrationFailed {
            version,
            reason: reason.into(),
        }
    }

    /// Create an invalid-record error
    pub fn invalid_record(collection: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            collection,
            reason: reason.into(),
        }
    }

    /// True for errors that make the store unusable as a whole
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MigrationFailed { .. } | Self::StorageUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(StoreError::migration_failed(3, "quota").is_fatal());
        assert!(StoreError::StorageUnavailable {
            reason: "private browsing".into()
        }
        .is_fatal());
        assert!(!StoreError::not_found("checkins", "abc").is_fatal());
        assert!(!StoreError::duplicate_key("checkins", "abc").is_fatal());
        assert!(!StoreError::unsupported_query("checkins", "notes").is_fatal());
    }

    #[test]
    fn display_includes_context() {
        let err = StoreError::unsupported_query("checkins", "notes");
        assert_eq!(err.to_string(), "Field 'notes' is not indexed on checkins");
    }
}
