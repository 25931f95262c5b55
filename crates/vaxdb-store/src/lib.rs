//! VaxDB Store - embedded document store for the clinic app
//!
//! Provides:
//! - SQLite-backed collections of JSON documents with extracted indexes
//! - Versioned schema migrations driven by the ladder in vaxdb-core
//! - A cloneable database handle with first-use seeding
//! - A change bus for live queries
//! - Export/import of full-database JSON bundles

pub mod collection;
pub mod db;
pub mod errors;
pub mod export;
pub mod handle;
pub mod live;
pub mod migrations;

// Re-export key types
pub use collection::{Collection, Matcher, OrderedQuery};
pub use errors::Result;
pub use handle::VaccineDb;
pub use live::{ChangeEvent, ChangeKind, FeedPoll, LiveQuery};
