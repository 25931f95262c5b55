//! Migration runner
//!
//! Applies ladder versions in order, one transaction per version, with
//! idempotency: versions already recorded in `schema_version` are skipped,
//! and every DDL statement is itself guarded (CREATE IF NOT EXISTS, column
//! presence checks), so a run interrupted mid-version converges on retry.

use rusqlite::{Connection, OptionalExtension, Transaction};
use tracing::{debug, info};
use vaxdb_core::schema::{self, CollectionSpec, FieldType, SchemaVersion};
use vaxdb_core::{KeyKind, StoreError};

use crate::errors::{from_rusqlite, Result};

/// Apply all pending migrations up to the target schema version
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    apply_migrations_up_to(conn, schema::TARGET_VERSION)
}

/// Apply pending migrations up to `max_version` only.
///
/// Used by tests to park a store at an intermediate version; production
/// code always goes through [`apply_migrations`].
///
/// # Errors
///
/// Returns `MigrationFailed` if a version cannot be applied; earlier
/// versions that committed stay committed.
pub fn apply_migrations_up_to(conn: &mut Connection, max_version: u32) -> Result<()> {
    create_schema_version_table(conn)?;

    let installed = installed_version(conn)?;
    for step in schema::ladder() {
        if step.version > max_version {
            break;
        }
        if step.version <= installed {
            debug!(version = step.version, "schema version already applied");
            continue;
        }
        apply_version(conn, step)?;
        info!(version = step.version, "schema version applied");
    }

    Ok(())
}

/// Highest schema version recorded as applied, or 0 for a fresh store
pub fn installed_version(conn: &Connection) -> Result<u32> {
    if !has_schema_version_table(conn)? {
        return Ok(0);
    }
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })
        .map_err(|e| from_rusqlite("installed_version", e))?;
    Ok(version.unwrap_or(0))
}

/// True when no schema version has ever been applied
pub fn is_fresh_store(conn: &Connection) -> Result<bool> {
    Ok(installed_version(conn)? == 0)
}

fn has_schema_version_table(conn: &Connection) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| from_rusqlite("installed_version", e))?;
    Ok(found.is_some())
}

fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| from_rusqlite("migrate", e))?;

    Ok(())
}

/// Apply one ladder step inside its own transaction
fn apply_version(conn: &mut Connection, step: &SchemaVersion) -> Result<()> {
    let tx = conn
        .transaction()
        .map_err(|e| StoreError::migration_failed(step.version, e.to_string()))?;

    for coll in step.collections {
        apply_collection(&tx, step.version, coll)?;
    }

    let now = chrono::Utc::now().timestamp_millis();
    tx.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?, ?)",
        rusqlite::params![step.version, now],
    )
    .map_err(|e| StoreError::migration_failed(step.version, e.to_string()))?;

    tx.commit()
        .map_err(|e| StoreError::migration_failed(step.version, e.to_string()))
}

/// Bring one collection's table up to the declared shape.
///
/// Creates the table when missing, adds any missing index columns
/// (backfilling them from the stored documents), and ensures the indexes
/// exist.
fn apply_collection(tx: &Transaction, version: u32, coll: &CollectionSpec) -> Result<()> {
    let fail = |e: rusqlite::Error| StoreError::migration_failed(version, e.to_string());

    let key_ddl = match coll.key {
        KeyKind::CallerSupplied => "\"key\" TEXT PRIMARY KEY NOT NULL",
        KeyKind::AutoIncrement => "\"key\" INTEGER PRIMARY KEY AUTOINCREMENT",
    };
    let mut create = format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({}, doc TEXT NOT NULL",
        coll.name, key_ddl
    );
    for field in coll.indexes {
        create.push_str(&format!(", \"{}\" {}", field.name, affinity(field.ty)));
    }
    create.push(')');
    tx.execute(&create, []).map_err(fail)?;

    // Tables created by an earlier version may lack columns this version
    // indexes. Add them and backfill from the documents, so existing rows
    // become query-visible just like freshly written ones.
    let existing = existing_columns(tx, version, coll.name)?;
    for field in coll.indexes {
        if existing.iter().any(|c| c == field.name) {
            continue;
        }
        tx.execute(
            &format!(
                "ALTER TABLE \"{}\" ADD COLUMN \"{}\" {}",
                coll.name,
                field.name,
                affinity(field.ty)
            ),
            [],
        )
        .map_err(fail)?;
        tx.execute(
            &format!(
                "UPDATE \"{table}\" SET \"{col}\" = json_extract(doc, '$.{col}')",
                table = coll.name,
                col = field.name
            ),
            [],
        )
        .map_err(fail)?;
    }

    for field in coll.indexes {
        tx.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{table}_{col}\" ON \"{table}\" (\"{col}\")",
                table = coll.name,
                col = field.name
            ),
            [],
        )
        .map_err(fail)?;
    }

    Ok(())
}

fn existing_columns(tx: &Transaction, version: u32, table: &str) -> Result<Vec<String>> {
    let mut stmt = tx
        .prepare(&format!("PRAGMA table_info(\"{}\")", table))
        .map_err(|e| StoreError::migration_failed(version, e.to_string()))?;
    let cols = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| StoreError::migration_failed(version, e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StoreError::migration_failed(version, e.to_string()))?;
    Ok(cols)
}

fn affinity(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Text => "TEXT",
        FieldType::Integer => "INTEGER",
        FieldType::Real => "REAL",
    }
}
