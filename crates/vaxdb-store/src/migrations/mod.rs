//! Schema migrations
//!
//! The ladder itself lives in vaxdb-core; this module turns each version's
//! full-state declaration into idempotent DDL and tracks what has been
//! applied in the `schema_version` bookkeeping table.

pub mod runner;

pub use runner::{apply_migrations, apply_migrations_up_to, installed_version, is_fresh_store};
