//! Database handle
//!
//! `VaccineDb` owns the single SQLite connection behind a mutex and hands
//! out typed collections. Opening runs configuration, the migration
//! ladder, and first-use seeding; a handle is cheap to clone and safe to
//! share across threads.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;
use vaxdb_core::model::{
    CheckIn, ClientAccount, InventoryItem, InvoiceRecord, Project, Settings, VaccineTemplate,
};
use vaxdb_core::{queue, schema, StoreError, StoreRecord};

use crate::collection::{self, Collection};
use crate::errors::{from_rusqlite, Result};
use crate::live::{ChangeBus, ChangeEvent, ChangeKind, LiveQuery};
use crate::{db, migrations};

/// Fixed key of the settings singleton row
const SETTINGS_KEY: i64 = 1;

pub(crate) struct DbInner {
    conn: Mutex<Connection>,
    pub(crate) changes: ChangeBus,
}

impl DbInner {
    /// Lock the connection. A poisoned lock means a writer panicked
    /// mid-operation; the store is treated as unusable from then on.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::StorageUnavailable {
            reason: "connection lock poisoned".to_string(),
        })
    }
}

/// Handle to the clinic database
#[derive(Clone)]
pub struct VaccineDb {
    inner: Arc<DbInner>,
}

impl VaccineDb {
    /// Open (creating if necessary) the database file, migrate it to the
    /// target schema version, and seed defaults on first use.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` if the file cannot be opened or configured;
    /// `MigrationFailed` if the schema cannot be brought up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::bootstrap(db::open(path)?)
    }

    /// In-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(db::open_in_memory()?)
    }

    fn bootstrap(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        let fresh = migrations::is_fresh_store(&conn)?;
        migrations::apply_migrations(&mut conn)?;
        if fresh {
            info!("fresh store created, seeding defaults");
        }
        seed_defaults(&conn)?;

        Ok(Self {
            inner: Arc::new(DbInner {
                conn: Mutex::new(conn),
                changes: ChangeBus::new(),
            }),
        })
    }

    pub fn checkins(&self) -> Collection<CheckIn> {
        Collection::new(Arc::clone(&self.inner))
    }

    pub fn templates(&self) -> Collection<VaccineTemplate> {
        Collection::new(Arc::clone(&self.inner))
    }

    pub fn projects(&self) -> Collection<Project> {
        Collection::new(Arc::clone(&self.inner))
    }

    pub fn inventory(&self) -> Collection<InventoryItem> {
        Collection::new(Arc::clone(&self.inner))
    }

    pub fn invoices(&self) -> Collection<InvoiceRecord> {
        Collection::new(Arc::clone(&self.inner))
    }

    pub fn client_accounts(&self) -> Collection<ClientAccount> {
        Collection::new(Arc::clone(&self.inner))
    }

    pub(crate) fn settings_collection(&self) -> Collection<Settings> {
        Collection::new(Arc::clone(&self.inner))
    }

    /// The settings singleton. Falls back to defaults if the row is
    /// somehow missing, so callers never deal with an absent row.
    pub fn get_settings(&self) -> Result<Settings> {
        Ok(self
            .settings_collection()
            .get(&SETTINGS_KEY)?
            .unwrap_or_else(Settings::defaults))
    }

    /// Replace the settings singleton
    pub fn put_settings(&self, settings: &mut Settings) -> Result<()> {
        settings.id = Some(SETTINGS_KEY);
        self.settings_collection().put(settings)?;
        Ok(())
    }

    /// Subscribe to changes on the given collections; an empty slice
    /// watches everything.
    pub fn watch(&self, collections: &[&'static str]) -> LiveQuery {
        self.inner.changes.subscribe(collections.to_vec())
    }

    /// Peek at the next queue number for `date`, e.g. "20260823-004".
    ///
    /// For display only (the kiosk's "now serving" preview). The number
    /// is not reserved: check-in creation must go through
    /// [`add_checkin`](Self::add_checkin), which assigns the number and
    /// inserts the record in one critical section.
    pub fn next_queue_number(&self, date: NaiveDate) -> Result<String> {
        let conn = self.inner.conn()?;
        scan_next_queue_number(&conn, date)
    }

    /// Check a patient in: assign the day's next queue number and insert
    /// the record, atomically.
    ///
    /// The scan and the insert happen under one hold of the connection
    /// lock, inside one transaction, so concurrent check-ins can never
    /// share a number even with identical timestamps. Whatever
    /// `queueNumber` the record carried is overwritten. Returns the
    /// assigned number.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` when the check-in id already exists.
    pub fn add_checkin(&self, checkin: &mut CheckIn, date: NaiveDate) -> Result<String> {
        checkin.validate()?;
        let spec = schema::collection_spec(CheckIn::COLLECTION).ok_or_else(|| {
            StoreError::StorageUnavailable {
                reason: "checkins collection missing from target schema".to_string(),
            }
        })?;

        let number;
        {
            let mut conn = self.inner.conn()?;
            let tx = conn
                .transaction()
                .map_err(|e| from_rusqlite("add_checkin", e))?;
            number = scan_next_queue_number(&tx, date)?;
            checkin.queue_number = number.clone();
            collection::insert_new(&tx, spec, checkin)?;
            tx.commit().map_err(|e| from_rusqlite("add_checkin", e))?;
        }

        self.inner.changes.publish(ChangeEvent {
            collection: CheckIn::COLLECTION,
            kind: ChangeKind::Added,
            key: Some(checkin.id.clone()),
        });
        Ok(number)
    }

    /// Wipe every collection and restore the seeded defaults.
    ///
    /// Clearing and reseeding happen in one transaction, so no reader
    /// ever observes a store without its settings row.
    pub fn delete_all(&self) -> Result<()> {
        {
            let mut conn = self.inner.conn()?;
            let tx = conn
                .transaction()
                .map_err(|e| from_rusqlite("delete_all", e))?;
            for coll in schema::target().collections {
                tx.execute(&format!("DELETE FROM \"{}\"", coll.name), [])
                    .map_err(|e| from_rusqlite("delete_all", e))?;
            }
            // Restart auto-increment counters along with the data
            tx.execute("DELETE FROM sqlite_sequence", [])
                .map_err(|e| from_rusqlite("delete_all", e))?;
            insert_default_settings(&tx)?;
            tx.commit().map_err(|e| from_rusqlite("delete_all", e))?;
        }

        for coll in schema::target().collections {
            self.inner.changes.publish(ChangeEvent {
                collection: coll.name,
                kind: ChangeKind::Cleared,
                key: None,
            });
        }
        Ok(())
    }
}

/// Next free queue number for the date prefix.
///
/// Parses the day's existing numbers and returns highest + 1; a plain
/// `MAX()` would compare lexicographically and break past 999.
fn scan_next_queue_number(conn: &Connection, date: NaiveDate) -> Result<String> {
    let prefix = queue::queue_prefix(date);

    let mut stmt = conn
        .prepare("SELECT \"queueNumber\" FROM checkins WHERE \"queueNumber\" LIKE ?")
        .map_err(|e| from_rusqlite("next_queue_number", e))?;
    let numbers = stmt
        .query_map([format!("{prefix}-%")], |row| row.get::<_, String>(0))
        .map_err(|e| from_rusqlite("next_queue_number", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| from_rusqlite("next_queue_number", e))?;

    let highest = numbers
        .iter()
        .filter_map(|n| queue::parse_queue_number(&prefix, n))
        .max()
        .unwrap_or(0);
    Ok(queue::format_queue_number(date, highest + 1))
}

/// Insert the default settings row when it is absent
fn seed_defaults(conn: &Connection) -> Result<()> {
    let doc = encode_defaults()?;
    conn.execute(
        "INSERT OR IGNORE INTO settings (\"key\", doc) VALUES (?, ?)",
        rusqlite::params![SETTINGS_KEY, doc],
    )
    .map_err(|e| from_rusqlite("seed", e))?;
    Ok(())
}

fn insert_default_settings(conn: &Connection) -> Result<()> {
    let doc = encode_defaults()?;
    conn.execute(
        "INSERT INTO settings (\"key\", doc) VALUES (?, ?)",
        rusqlite::params![SETTINGS_KEY, doc],
    )
    .map_err(|e| from_rusqlite("seed", e))?;
    Ok(())
}

fn encode_defaults() -> Result<String> {
    serde_json::to_string(&Settings::defaults())
        .map_err(|e| StoreError::invalid_record("settings", e.to_string()))
}
