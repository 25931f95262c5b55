//! Generic collection over one record type
//!
//! Each collection is one SQLite table: a primary key column, the full
//! record as a JSON `doc` column, and one nullable column per indexed
//! field, extracted from the document on every write. Queries only touch
//! the extracted columns; reads always deserialize the document.

use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Transaction};
use vaxdb_core::schema::{self, CollectionSpec};
use vaxdb_core::{IndexValue, KeyKind, StoreError, StoreKey, StoreRecord};

use crate::errors::{from_rusqlite, is_constraint_violation, Result};
use crate::handle::DbInner;
use crate::live::{ChangeEvent, ChangeKind};

/// Predicate over one indexed field
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    Equals(IndexValue),
    /// Strictly greater than
    Above(IndexValue),
    /// Inclusive on both ends
    InRange(IndexValue, IndexValue),
}

/// Typed CRUD and query interface over one collection
pub struct Collection<T: StoreRecord> {
    inner: Arc<DbInner>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: StoreRecord> Collection<T> {
    pub(crate) fn new(inner: Arc<DbInner>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    fn spec() -> Result<&'static CollectionSpec> {
        schema::collection_spec(T::COLLECTION).ok_or_else(|| StoreError::StorageUnavailable {
            reason: format!("collection {} missing from target schema", T::COLLECTION),
        })
    }

    /// Point lookup by primary key
    pub fn get(&self, key: &T::Key) -> Result<Option<T>> {
        let conn = self.inner.conn()?;
        get_in(&conn, key)
    }

    /// Insert a new record; fails with `DuplicateKey` if the key exists.
    ///
    /// Auto-increment collections may leave the key unset; the assigned key
    /// is written back into both the record and the stored document.
    pub fn add(&self, record: &mut T) -> Result<T::Key> {
        record.validate()?;
        let spec = Self::spec()?;

        let mut conn = self.inner.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| from_rusqlite("add", e))?;
        let key = insert_new(&tx, spec, record)?;
        tx.commit().map_err(|e| from_rusqlite("add", e))?;
        drop(conn);

        self.publish(ChangeKind::Added, Some(key.to_string()));
        Ok(key)
    }

    /// Insert or fully replace (upsert). Returns the record's key.
    pub fn put(&self, record: &mut T) -> Result<T::Key> {
        record.validate()?;
        let spec = Self::spec()?;

        let Some(key) = record.key() else {
            // No key yet: a put cannot replace anything, so it is an add
            return self.add(record);
        };

        let mut conn = self.inner.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| from_rusqlite("put", e))?;
        let existed = row_exists(&tx, T::COLLECTION, &key)?;
        upsert(&tx, spec, record, &key)?;
        tx.commit().map_err(|e| from_rusqlite("put", e))?;
        drop(conn);

        let kind = if existed {
            ChangeKind::Updated
        } else {
            ChangeKind::Added
        };
        self.publish(kind, Some(key.to_string()));
        Ok(key)
    }

    /// Shallow-merge a JSON patch into an existing record.
    ///
    /// Fields present in the patch replace the stored ones; all other
    /// fields are untouched. The primary key cannot be changed this way.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key has no record; `InvalidRecord` when the
    /// patch is not a JSON object or the merged document no longer decodes.
    pub fn update(&self, key: &T::Key, patch: &serde_json::Value) -> Result<T> {
        let Some(patch_fields) = patch.as_object() else {
            return Err(StoreError::invalid_record(
                T::COLLECTION,
                "update patch must be a JSON object",
            ));
        };
        let spec = Self::spec()?;

        let mut conn = self.inner.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| from_rusqlite("update", e))?;

        let stored: T = get_in(&tx, key)?
            .ok_or_else(|| StoreError::not_found(T::COLLECTION, key.clone()))?;
        let mut doc = serde_json::to_value(&stored)
            .map_err(|e| StoreError::invalid_record(T::COLLECTION, e.to_string()))?;
        let Some(doc_fields) = doc.as_object_mut() else {
            return Err(StoreError::invalid_record(
                T::COLLECTION,
                "stored document is not a JSON object",
            ));
        };
        for (field, value) in patch_fields {
            doc_fields.insert(field.clone(), value.clone());
        }

        let mut merged: T = serde_json::from_value(doc)
            .map_err(|e| StoreError::invalid_record(T::COLLECTION, e.to_string()))?;
        merged.assign_key(key.clone());
        merged.validate()?;
        upsert(&tx, spec, &mut merged, key)?;
        tx.commit().map_err(|e| from_rusqlite("update", e))?;
        drop(conn);

        self.publish(ChangeKind::Updated, Some(key.to_string()));
        Ok(merged)
    }

    /// Delete by key. Deleting a missing key is a no-op.
    pub fn delete(&self, key: &T::Key) -> Result<()> {
        let conn = self.inner.conn()?;
        let removed = conn
            .execute(
                &format!("DELETE FROM \"{}\" WHERE \"key\" = ?", T::COLLECTION),
                [sql_value(&key.to_index_value())],
            )
            .map_err(|e| from_rusqlite("delete", e))?;
        drop(conn);

        if removed > 0 {
            self.publish(ChangeKind::Deleted, Some(key.to_string()));
        }
        Ok(())
    }

    /// All records in primary-key order
    pub fn to_array(&self) -> Result<Vec<T>> {
        let conn = self.inner.conn()?;
        collect_docs(
            &conn,
            &format!(
                "SELECT doc FROM \"{}\" ORDER BY \"key\"",
                T::COLLECTION
            ),
            Vec::new(),
        )
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.inner.conn()?;
        conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", T::COLLECTION),
            [],
            |row| row.get(0),
        )
        .map_err(|e| from_rusqlite("count", e))
    }

    /// Records matching a predicate on an indexed field.
    ///
    /// Results are ordered by the queried field, ties broken by primary
    /// key.
    ///
    /// # Errors
    ///
    /// `UnsupportedQuery` when the field is not indexed in the target
    /// schema.
    pub fn query_by_index(&self, field: &str, matcher: Matcher) -> Result<Vec<T>> {
        if !schema::is_indexed(T::COLLECTION, field) {
            return Err(StoreError::unsupported_query(T::COLLECTION, field));
        }

        let (clause, params) = match matcher {
            Matcher::Equals(v) => (format!("\"{field}\" = ?"), vec![sql_value(&v)]),
            Matcher::Above(v) => (format!("\"{field}\" > ?"), vec![sql_value(&v)]),
            Matcher::InRange(lo, hi) => (
                format!("\"{field}\" BETWEEN ? AND ?"),
                vec![sql_value(&lo), sql_value(&hi)],
            ),
        };
        let sql = format!(
            "SELECT doc FROM \"{table}\" WHERE {clause} ORDER BY \"{field}\", \"key\"",
            table = T::COLLECTION,
        );

        let conn = self.inner.conn()?;
        collect_docs(&conn, &sql, params)
    }

    /// Ordered iteration over an indexed field
    ///
    /// # Errors
    ///
    /// `UnsupportedQuery` when the field is not indexed in the target
    /// schema.
    pub fn order_by(&self, field: &str) -> Result<OrderedQuery<T>> {
        if !schema::is_indexed(T::COLLECTION, field) {
            return Err(StoreError::unsupported_query(T::COLLECTION, field));
        }
        Ok(OrderedQuery {
            inner: Arc::clone(&self.inner),
            field: field.to_string(),
            descending: false,
            limit: None,
            _marker: PhantomData,
        })
    }

    fn publish(&self, kind: ChangeKind, key: Option<String>) {
        self.inner.changes.publish(ChangeEvent {
            collection: T::COLLECTION,
            kind,
            key,
        });
    }
}

/// Builder for `order_by(field).reverse().limit(n)` reads.
///
/// Ties on the ordering field are broken by primary key, ascending, in
/// both directions.
pub struct OrderedQuery<T: StoreRecord> {
    inner: Arc<DbInner>,
    field: String,
    descending: bool,
    limit: Option<u64>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: StoreRecord> OrderedQuery<T> {
    pub fn reverse(mut self) -> Self {
        self.descending = !self.descending;
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Number of records the query would return (honors `limit`)
    pub fn count(&self) -> Result<u64> {
        let mut inner = format!("SELECT 1 FROM \"{}\"", T::COLLECTION);
        if let Some(n) = self.limit {
            inner.push_str(&format!(" LIMIT {n}"));
        }
        let conn = self.inner.conn()?;
        conn.query_row(&format!("SELECT COUNT(*) FROM ({inner})"), [], |row| {
            row.get(0)
        })
        .map_err(|e| from_rusqlite("count", e))
    }

    pub fn run(self) -> Result<Vec<T>> {
        let direction = if self.descending { "DESC" } else { "ASC" };
        let mut sql = format!(
            "SELECT doc FROM \"{table}\" ORDER BY \"{field}\" {direction}, \"key\"",
            table = T::COLLECTION,
            field = self.field,
        );
        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        let conn = self.inner.conn()?;
        collect_docs(&conn, &sql, Vec::new())
    }
}

// ---- row helpers ----

fn sql_value(v: &IndexValue) -> SqlValue {
    match v {
        IndexValue::Text(s) => SqlValue::Text(s.clone()),
        IndexValue::Int(i) => SqlValue::Integer(*i),
        IndexValue::Real(r) => SqlValue::Real(*r),
    }
}

/// Pull an indexed field out of the serialized document.
///
/// A missing, null, or structurally incompatible field indexes as NULL,
/// which never matches an equality or range query.
fn extract_index(doc: &serde_json::Value, field: &str) -> SqlValue {
    match &doc[field] {
        serde_json::Value::String(s) => SqlValue::Text(s.clone()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::Real(f)
            } else {
                SqlValue::Null
            }
        }
        serde_json::Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        _ => SqlValue::Null,
    }
}

fn encode<T: StoreRecord>(record: &T) -> Result<(String, serde_json::Value)> {
    let doc = serde_json::to_value(record)
        .map_err(|e| StoreError::invalid_record(T::COLLECTION, e.to_string()))?;
    let text = doc.to_string();
    Ok((text, doc))
}

fn decode<T: StoreRecord>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| StoreError::invalid_record(T::COLLECTION, e.to_string()))
}

fn get_in<T: StoreRecord>(conn: &Connection, key: &T::Key) -> Result<Option<T>> {
    let text: Option<String> = conn
        .query_row(
            &format!("SELECT doc FROM \"{}\" WHERE \"key\" = ?", T::COLLECTION),
            [sql_value(&key.to_index_value())],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| from_rusqlite("get", e))?;
    text.map(|t| decode(&t)).transpose()
}

fn row_exists<K: StoreKey>(tx: &Transaction, table: &str, key: &K) -> Result<bool> {
    let found: Option<i64> = tx
        .query_row(
            &format!("SELECT 1 FROM \"{table}\" WHERE \"key\" = ?"),
            [sql_value(&key.to_index_value())],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| from_rusqlite("put", e))?;
    Ok(found.is_some())
}

fn collect_docs<T: StoreRecord>(
    conn: &Connection,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql).map_err(|e| from_rusqlite("query", e))?;
    let texts = stmt
        .query_map(params_from_iter(params), |row| row.get::<_, String>(0))
        .map_err(|e| from_rusqlite("query", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| from_rusqlite("query", e))?;
    texts.iter().map(|t| decode(t)).collect()
}

/// INSERT a record that must not exist yet. Assigns and writes back the
/// key for auto-increment collections.
pub(crate) fn insert_new<T: StoreRecord>(
    tx: &Transaction,
    spec: &CollectionSpec,
    record: &mut T,
) -> Result<T::Key> {
    if record.key().is_none() && <T::Key as StoreKey>::KIND == KeyKind::CallerSupplied {
        return Err(StoreError::invalid_record(
            T::COLLECTION,
            "record has no primary key",
        ));
    }
    let (text, doc) = encode(record)?;

    let mut columns = vec!["\"key\"".to_string(), "doc".to_string()];
    let key_value = match record.key() {
        Some(k) => sql_value(&k.to_index_value()),
        None => SqlValue::Null,
    };
    let mut values = vec![key_value, SqlValue::Text(text)];
    for field in spec.indexes {
        columns.push(format!("\"{}\"", field.name));
        values.push(extract_index(&doc, field.name));
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        spec.name,
        columns.join(", "),
        placeholders
    );

    tx.execute(&sql, params_from_iter(values)).map_err(|e| {
        if is_constraint_violation(&e) {
            let key = record
                .key()
                .map(|k| k.to_string())
                .unwrap_or_default();
            StoreError::duplicate_key(T::COLLECTION, key)
        } else {
            from_rusqlite("add", e)
        }
    })?;

    match record.key() {
        Some(key) => Ok(key),
        None => {
            let rowid = tx.last_insert_rowid();
            let key = T::Key::from_rowid(rowid).ok_or_else(|| {
                StoreError::invalid_record(T::COLLECTION, "record has no primary key")
            })?;
            record.assign_key(key.clone());
            // The stored document must carry the assigned key too
            let (text, _) = encode(record)?;
            tx.execute(
                &format!("UPDATE \"{}\" SET doc = ? WHERE \"key\" = ?", spec.name),
                rusqlite::params![text, rowid],
            )
            .map_err(|e| from_rusqlite("add", e))?;
            Ok(key)
        }
    }
}

/// INSERT .. ON CONFLICT upsert of a fully keyed record
fn upsert<T: StoreRecord>(
    tx: &Transaction,
    spec: &CollectionSpec,
    record: &mut T,
    key: &T::Key,
) -> Result<()> {
    let (text, doc) = encode(record)?;

    let mut columns = vec!["\"key\"".to_string(), "doc".to_string()];
    let mut values = vec![sql_value(&key.to_index_value()), SqlValue::Text(text)];
    let mut assignments = vec!["doc = excluded.doc".to_string()];
    for field in spec.indexes {
        columns.push(format!("\"{}\"", field.name));
        values.push(extract_index(&doc, field.name));
        assignments.push(format!(
            "\"{name}\" = excluded.\"{name}\"",
            name = field.name
        ));
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) ON CONFLICT(\"key\") DO UPDATE SET {}",
        spec.name,
        columns.join(", "),
        placeholders,
        assignments.join(", ")
    );

    tx.execute(&sql, params_from_iter(values))
        .map_err(|e| from_rusqlite("put", e))?;
    Ok(())
}
