//! Database connection management
//!
//! Provides utilities for opening and configuring SQLite connections.
//! Failures here surface as `StorageUnavailable`: if the file cannot be
//! opened or configured, the store as a whole is unusable.

use std::path::Path;

use rusqlite::Connection;

use crate::errors::{storage_unavailable, Result};

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(storage_unavailable)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(storage_unavailable)
}

/// Configure a connection with optimal settings
pub fn configure(conn: &Connection) -> Result<()> {
    // journal_mode returns a row, so it goes through pragma_update.
    // Foreign keys stay off: cross-record links are weak references and
    // deleting a referenced record leaves the link dangling.
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(storage_unavailable)?;

    Ok(())
}
