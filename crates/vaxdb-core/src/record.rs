//! Record trait and index value types
//!
//! `StoreRecord` binds a domain type to its collection name and key
//! discipline. Records are persisted as JSON documents; indexed fields are
//! extracted from the document by name, so a field absent from an old
//! document simply indexes as NULL and never matches a query.

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::Result;

/// How a collection's primary keys are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// The caller supplies the key on insert (string keys)
    CallerSupplied,
    /// The store assigns the next integer key on insert
    AutoIncrement,
}

/// A value stored in an index column
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    Text(String),
    Int(i64),
    Real(f64),
}

impl From<&str> for IndexValue {
    fn from(v: &str) -> Self {
        IndexValue::Text(v.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(v: String) -> Self {
        IndexValue::Text(v)
    }
}

impl From<i64> for IndexValue {
    fn from(v: i64) -> Self {
        IndexValue::Int(v)
    }
}

impl From<f64> for IndexValue {
    fn from(v: f64) -> Self {
        IndexValue::Real(v)
    }
}

/// Primary key type for a collection
pub trait StoreKey: Clone + std::fmt::Display + Send {
    /// Key discipline for this key type
    const KIND: KeyKind;

    /// The key as an index value (for binding into queries)
    fn to_index_value(&self) -> IndexValue;

    /// Build a key from a freshly assigned integer row id, when supported
    fn from_rowid(rowid: i64) -> Option<Self>;
}

impl StoreKey for String {
    const KIND: KeyKind = KeyKind::CallerSupplied;

    fn to_index_value(&self) -> IndexValue {
        IndexValue::Text(self.clone())
    }

    fn from_rowid(_rowid: i64) -> Option<Self> {
        None
    }
}

impl StoreKey for i64 {
    const KIND: KeyKind = KeyKind::AutoIncrement;

    fn to_index_value(&self) -> IndexValue {
        IndexValue::Int(*self)
    }

    fn from_rowid(rowid: i64) -> Option<Self> {
        Some(rowid)
    }
}

/// A domain record persisted in its own collection
pub trait StoreRecord: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// Collection (table) name, matching the schema ladder declarations
    const COLLECTION: &'static str;

    /// Primary key type
    type Key: StoreKey;

    /// The record's key, if it carries one
    fn key(&self) -> Option<Self::Key>;

    /// Set the record's key (used when the store assigns one)
    fn assign_key(&mut self, key: Self::Key);

    /// Boundary validation beyond what the type shape already enforces.
    ///
    /// The default accepts everything; records with constrained numeric
    /// fields (dose number, feedback rating) override this.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
