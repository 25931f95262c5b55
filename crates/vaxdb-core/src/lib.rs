//! VaxDB core - domain records and schema declarations
//!
//! Provides:
//! - The seven clinic record types and their serde document shapes
//! - The `StoreRecord` trait binding each record to its collection
//! - The schema ladder (ordered full-state version declarations)
//! - The canonical error taxonomy for store operations
//! - Queue number and password utilities

pub mod auth;
pub mod errors;
pub mod model;
pub mod queue;
pub mod record;
pub mod schema;

// Re-export key types
pub use errors::{Result, StoreError};
pub use record::{IndexValue, KeyKind, StoreKey, StoreRecord};
