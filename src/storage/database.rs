// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! Records are JSON bytes keyed by id or by a composite key. Secondary
//! indexes map a composite key to the id of the referenced record.
//!
//! | Table               | Key                 | Value              |
//! |---------------------|---------------------|--------------------|
//! | `users`             | user_id             | StoredUser         |
//! | `user_emails`       | normalized email    | user_id            |
//! | `groups`            | group_id            | StoredGroup        |
//! | `memberships`       | group ␟ user        | StoredMembership   |
//! | `user_memberships`  | user ␟ group        | group_id           |
//! | `notes`             | note_id             | StoredNote         |
//! | `notes_by_owner`    | owner ␟ note        | note_id            |
//! | `notes_by_group`    | group ␟ note        | note_id            |
//! | `shares`            | note ␟ user         | StoredShare        |
//! | `shares_by_user`    | user ␟ note         | note_id            |
//! | `tags`              | tag_id              | StoredTag          |
//! | `tags_by_creator`   | creator ␟ name      | tag_id             |
//! | `note_tags`         | note ␟ tag          | tag_id             |
//! | `audit_events`      | date ␟ millis ␟ id  | AuditEvent         |
//!
//! `␟` is the ASCII unit separator (0x1F). User ids come from identity
//! tokens and may contain `|`, so a control character keeps prefix scans
//! unambiguous.
//!
//! Writes go through [`Store::write`]: one redb write transaction per call.
//! redb admits a single writer at a time, so checks made inside the closure
//! see the state the commit applies to.

use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

// =============================================================================
// Table Definitions
// =============================================================================

/// Table of JSON-encoded records.
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Secondary index: composite key → referenced id.
pub type IndexTable = TableDefinition<'static, &'static str, &'static str>;

pub const USERS: JsonTable = TableDefinition::new("users");
pub const USER_EMAILS: IndexTable = TableDefinition::new("user_emails");
pub const GROUPS: JsonTable = TableDefinition::new("groups");
pub const MEMBERSHIPS: JsonTable = TableDefinition::new("memberships");
pub const USER_MEMBERSHIPS: IndexTable = TableDefinition::new("user_memberships");
pub const NOTES: JsonTable = TableDefinition::new("notes");
pub const NOTES_BY_OWNER: IndexTable = TableDefinition::new("notes_by_owner");
pub const NOTES_BY_GROUP: IndexTable = TableDefinition::new("notes_by_group");
pub const SHARES: JsonTable = TableDefinition::new("shares");
pub const SHARES_BY_USER: IndexTable = TableDefinition::new("shares_by_user");
pub const TAGS: JsonTable = TableDefinition::new("tags");
pub const TAGS_BY_CREATOR: IndexTable = TableDefinition::new("tags_by_creator");
pub const NOTE_TAGS: IndexTable = TableDefinition::new("note_tags");
pub const AUDIT_EVENTS: JsonTable = TableDefinition::new("audit_events");

const JSON_TABLES: [JsonTable; 6] = [USERS, GROUPS, MEMBERSHIPS, NOTES, SHARES, TAGS];
const INDEX_TABLES: [IndexTable; 7] = [
    USER_EMAILS,
    USER_MEMBERSHIPS,
    NOTES_BY_OWNER,
    NOTES_BY_GROUP,
    SHARES_BY_USER,
    TAGS_BY_CREATOR,
    NOTE_TAGS,
];

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Uniqueness constraint violated
    #[error("constraint violated: {0}")]
    Conflict(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Key Helpers
// =============================================================================

/// Separator between the parts of a composite key.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Build a composite key `a ␟ b`.
pub fn composite_key(a: &str, b: &str) -> String {
    let mut key = String::with_capacity(a.len() + 1 + b.len());
    key.push_str(a);
    key.push(KEY_SEPARATOR);
    key.push_str(b);
    key
}

/// Half-open range covering every composite key that starts with `prefix ␟`.
fn prefix_bounds(prefix: &str) -> (String, String) {
    let start = composite_key(prefix, "");
    let mut end = String::with_capacity(prefix.len() + 1);
    end.push_str(prefix);
    // 0x20 is the next code point after the separator
    end.push('\u{20}');
    (start, end)
}

fn read_json<T, R>(table: &T, key: &str) -> StorageResult<Option<R>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
    R: DeserializeOwned,
{
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn range_json<T, R>(table: &T, prefix: &str) -> StorageResult<Vec<R>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
    R: DeserializeOwned,
{
    let (start, end) = prefix_bounds(prefix);
    let mut records = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (_, value) = entry?;
        records.push(serde_json::from_slice(value.value())?);
    }
    Ok(records)
}

fn read_index<T>(table: &T, key: &str) -> StorageResult<Option<String>>
where
    T: ReadableTable<&'static str, &'static str>,
{
    match table.get(key)? {
        Some(value) => Ok(Some(value.value().to_string())),
        None => Ok(None),
    }
}

fn range_index<T>(table: &T, prefix: &str) -> StorageResult<Vec<String>>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let (start, end) = prefix_bounds(prefix);
    let mut ids = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (_, value) = entry?;
        ids.push(value.value().to_string());
    }
    Ok(ids)
}

// =============================================================================
// Transaction Access
// =============================================================================

/// Typed reads available on both read and write transactions.
///
/// Each call opens the table for its own duration, so calls must not be
/// nested inside one another.
pub trait TxRead {
    /// Fetch and decode a single record.
    fn get_json<R: DeserializeOwned>(&self, table: JsonTable, key: &str)
        -> StorageResult<Option<R>>;

    /// Decode every record whose composite key starts with `prefix`.
    fn scan_json<R: DeserializeOwned>(&self, table: JsonTable, prefix: &str)
        -> StorageResult<Vec<R>>;

    /// Look up a single index entry.
    fn index_get(&self, table: IndexTable, key: &str) -> StorageResult<Option<String>>;

    /// Referenced ids of every index entry whose key starts with `prefix`.
    fn index_scan(&self, table: IndexTable, prefix: &str) -> StorageResult<Vec<String>>;
}

macro_rules! impl_tx_read {
    ($txn:ty) => {
        impl TxRead for $txn {
            fn get_json<R: DeserializeOwned>(
                &self,
                table: JsonTable,
                key: &str,
            ) -> StorageResult<Option<R>> {
                read_json(&self.open_table(table)?, key)
            }

            fn scan_json<R: DeserializeOwned>(
                &self,
                table: JsonTable,
                prefix: &str,
            ) -> StorageResult<Vec<R>> {
                range_json(&self.open_table(table)?, prefix)
            }

            fn index_get(&self, table: IndexTable, key: &str) -> StorageResult<Option<String>> {
                read_index(&self.open_table(table)?, key)
            }

            fn index_scan(&self, table: IndexTable, prefix: &str) -> StorageResult<Vec<String>> {
                range_index(&self.open_table(table)?, prefix)
            }
        }
    };
}

impl_tx_read!(ReadTransaction);
impl_tx_read!(WriteTransaction);

/// Mutations, only available inside a write transaction.
pub trait TxWrite: TxRead {
    fn put_json<R: Serialize>(&self, table: JsonTable, key: &str, record: &R)
        -> StorageResult<()>;

    /// Returns whether a record was removed.
    fn remove_json(&self, table: JsonTable, key: &str) -> StorageResult<bool>;

    fn put_index(&self, table: IndexTable, key: &str, id: &str) -> StorageResult<()>;

    /// Returns whether an entry was removed.
    fn remove_index(&self, table: IndexTable, key: &str) -> StorageResult<bool>;
}

impl TxWrite for WriteTransaction {
    fn put_json<R: Serialize>(
        &self,
        table: JsonTable,
        key: &str,
        record: &R,
    ) -> StorageResult<()> {
        let json = serde_json::to_vec(record)?;
        let mut table = self.open_table(table)?;
        table.insert(key, json.as_slice())?;
        Ok(())
    }

    fn remove_json(&self, table: JsonTable, key: &str) -> StorageResult<bool> {
        let mut table = self.open_table(table)?;
        let removed = table.remove(key)?.is_some();
        Ok(removed)
    }

    fn put_index(&self, table: IndexTable, key: &str, id: &str) -> StorageResult<()> {
        let mut table = self.open_table(table)?;
        table.insert(key, id)?;
        Ok(())
    }

    fn remove_index(&self, table: IndexTable, key: &str) -> StorageResult<bool> {
        let mut table = self.open_table(table)?;
        let removed = table.remove(key)?.is_some();
        Ok(removed)
    }
}

// =============================================================================
// Store
// =============================================================================

/// Shared handle to the embedded database.
///
/// Cheap to clone; constructed once at startup and injected where needed.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open (or create) the database under the given data directory.
    pub fn open(paths: &StoragePaths) -> StorageResult<Self> {
        std::fs::create_dir_all(paths.root())?;
        Self::open_file(&paths.database())
    }

    /// Open (or create) the database file at `path`.
    pub fn open_file(path: &Path) -> StorageResult<Self> {
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            for table in JSON_TABLES {
                let _ = write_txn.open_table(table)?;
            }
            for table in INDEX_TABLES {
                let _ = write_txn.open_table(table)?;
            }
            let _ = write_txn.open_table(AUDIT_EVENTS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Run `f` against a consistent read snapshot.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&ReadTransaction) -> Result<T, E>,
        E: From<StorageError>,
    {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        f(&read_txn)
    }

    /// Run `f` inside a single write transaction.
    ///
    /// Commits when `f` returns `Ok`, aborts otherwise. Nothing `f` wrote is
    /// observable unless the whole closure succeeds.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&WriteTransaction) -> Result<T, E>,
        E: From<StorageError>,
    {
        let write_txn = self.db.begin_write().map_err(StorageError::from)?;
        match f(&write_txn) {
            Ok(value) => {
                write_txn.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = write_txn.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort write transaction");
                }
                Err(e)
            }
        }
    }

    /// Round-trip a read transaction for readiness probes.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde::Deserialize;

    pub(crate) fn temp_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&StoragePaths::new(dir.path())).unwrap();
        (store, dir)
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn put_and_get_json() {
        let (store, _dir) = temp_store();
        store
            .write(|txn| {
                txn.put_json(
                    USERS,
                    "u1",
                    &Sample {
                        name: "alice".into(),
                    },
                )
            })
            .unwrap();

        let got: Option<Sample> = store.read(|txn| txn.get_json(USERS, "u1")).unwrap();
        assert_eq!(got.unwrap().name, "alice");

        let missing: Option<Sample> = store.read(|txn| txn.get_json(USERS, "u2")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn index_scan_does_not_leak_across_prefixes() {
        let (store, _dir) = temp_store();
        store
            .write(|txn| -> StorageResult<()> {
                txn.put_index(USER_MEMBERSHIPS, &composite_key("ab", "g1"), "g1")?;
                txn.put_index(USER_MEMBERSHIPS, &composite_key("a", "g2"), "g2")?;
                txn.put_index(USER_MEMBERSHIPS, &composite_key("a|x", "g3"), "g3")?;
                txn.put_index(USER_MEMBERSHIPS, &composite_key("a", "g4"), "g4")?;
                Ok(())
            })
            .unwrap();

        let ids = store
            .read(|txn| txn.index_scan(USER_MEMBERSHIPS, "a"))
            .unwrap();
        assert_eq!(ids, vec!["g2".to_string(), "g4".to_string()]);
    }

    #[test]
    fn failed_write_is_rolled_back() {
        let (store, _dir) = temp_store();
        let result: StorageResult<()> = store.write(|txn| {
            txn.put_index(USER_EMAILS, "a@example.com", "u1")?;
            Err(StorageError::Conflict("forced".into()))
        });
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        let got = store
            .read(|txn| txn.index_get(USER_EMAILS, "a@example.com"))
            .unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn remove_reports_presence() {
        let (store, _dir) = temp_store();
        let (first, second) = store
            .write(|txn| -> StorageResult<(bool, bool)> {
                txn.put_index(NOTE_TAGS, "n\u{1f}t", "t")?;
                Ok((
                    txn.remove_index(NOTE_TAGS, "n\u{1f}t")?,
                    txn.remove_index(NOTE_TAGS, "n\u{1f}t")?,
                ))
            })
            .unwrap();
        assert!(first);
        assert!(!second);
    }

    #[test]
    fn health_check_passes_on_fresh_store() {
        let (store, _dir) = temp_store();
        assert!(store.health_check().is_ok());
    }
}
