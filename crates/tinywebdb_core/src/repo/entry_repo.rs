//! Entry store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide get/upsert/delete/scan primitives over `stored_entries`.
//! - Group primitives into one write transaction when a caller needs entry
//!   and index changes to land together.
//!
//! # Invariants
//! - `updated_at` is refreshed by SQL on every insert and update; callers
//!   never supply it.
//! - Scans are ordered by tag using byte-wise comparison, matching `String`
//!   ordering in Rust.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::entry::Entry;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENTRIES_TABLE: &str = "stored_entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Entry persistence error.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be read back into the model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "entry store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "entry store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid stored entry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Backend contract consumed by the index, view and mutation services.
pub trait EntryStore {
    /// Loads one entry by exact tag.
    fn get_by_tag(&self, tag: &str) -> RepoResult<Option<Entry>>;
    /// Creates or overwrites `tag` with encoded `value`, refreshing its timestamp.
    fn upsert(&self, tag: &str, value: &str) -> RepoResult<()>;
    /// Removes `tag`. Returns whether a row existed.
    fn delete_by_tag(&self, tag: &str) -> RepoResult<bool>;
    /// Returns every entry, including the index record, in ascending tag order.
    fn scan_all_ordered_by_tag(&self) -> RepoResult<Vec<Entry>>;
    /// Runs `op` inside one write transaction.
    ///
    /// Commits when `op` returns `Ok`, rolls back otherwise. A call made while
    /// a transaction is already open joins it.
    fn in_transaction<T, F>(&self, op: F) -> RepoResult<T>
    where
        F: FnOnce(&Self) -> RepoResult<T>;
}

/// SQLite-backed entry store.
pub struct SqliteEntryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// Rejects connections that did not go through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntryStore for SqliteEntryStore<'_> {
    fn get_by_tag(&self, tag: &str) -> RepoResult<Option<Entry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT tag, value, updated_at
                 FROM stored_entries
                 WHERE tag = ?1;",
                [tag],
                parse_entry_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn upsert(&self, tag: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO stored_entries (tag, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(tag) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![tag, value],
        )?;
        Ok(())
    }

    fn delete_by_tag(&self, tag: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM stored_entries WHERE tag = ?1;", [tag])?;
        Ok(changed > 0)
    }

    fn scan_all_ordered_by_tag(&self) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT tag, value, updated_at
             FROM stored_entries
             ORDER BY tag ASC;",
        )?;
        let rows = stmt.query_map([], parse_entry_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn in_transaction<T, F>(&self, op: F) -> RepoResult<T>
    where
        F: FnOnce(&Self) -> RepoResult<T>,
    {
        if !self.conn.is_autocommit() {
            return op(self);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let value = op(self)?;
        tx.commit()?;
        Ok(value)
    }
}

fn parse_entry_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        tag: row.get("tag")?,
        value: row.get("value")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [ENTRIES_TABLE],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable(ENTRIES_TABLE));
    }

    Ok(())
}
