//! SQLite connection facade
//!
//! A thin, typed wrapper around [`rusqlite::Connection`]. The rest of the
//! crate never touches the driver directly: statements go through
//! [`DbCommand`](crate::storage::DbCommand), and the connection exposes
//! only what the handlers and the facade need (batch DDL, flat
//! transactions, the last inserted row id).

use std::time::Duration;

use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::objects::ObjectId;

/// File name that keeps the whole database in memory.
pub const MEMORY_DB: &str = ":memory:";

/// Connection tuning applied when a database is opened.
///
/// All values have conservative defaults; construct with
/// `StorageConfig::default()` and override individual fields.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// How long the driver retries on a locked database file.
    pub busy_timeout_ms: u64,
    /// Use write-ahead logging for file-backed databases. Ignored for
    /// in-memory databases.
    pub enable_wal: bool,
    /// Page cache size in KiB.
    pub cache_size_kib: i64,
    /// Enforce foreign-key constraints. The document schema declares
    /// none, so this is off by default.
    pub foreign_keys: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            enable_wal: true,
            cache_size_kib: 65_536,
            foreign_keys: false,
        }
    }
}

/// An open connection to a document database.
pub struct DbConnection {
    conn: rusqlite::Connection,
}

impl DbConnection {
    /// Open the database file, creating it if necessary, and apply the
    /// given configuration. Pass [`MEMORY_DB`] to keep the database in
    /// memory.
    pub fn open(file_name: &str, config: &StorageConfig) -> StorageResult<Self> {
        let conn = rusqlite::Connection::open(file_name)?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.pragma_update(None, "cache_size", -config.cache_size_kib)?;
        if config.foreign_keys {
            conn.pragma_update(None, "foreign_keys", "ON")?;
        }
        if config.enable_wal && file_name != MEMORY_DB {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
        }

        debug!(file_name, "opened document database");
        Ok(Self { conn })
    }

    /// Close the connection, reporting any pending driver error.
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::Sql(e))
    }

    /// Execute one or more statements that return no rows (DDL, bare
    /// DML).
    pub fn execute_non_query(&self, sql: &str) -> StorageResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// The row id assigned by the most recent successful insert.
    pub fn last_inserted_row_id(&self) -> ObjectId {
        self.conn.last_insert_rowid()
    }

    /// Begin a flat unit of work. Multi-step facade operations are
    /// bracketed by the caller with this and [`end_transaction`].
    ///
    /// [`end_transaction`]: DbConnection::end_transaction
    pub fn start_transaction(&self) -> StorageResult<()> {
        self.execute_non_query("BEGIN TRANSACTION;")
    }

    /// Commit the unit of work started by [`start_transaction`].
    ///
    /// [`start_transaction`]: DbConnection::start_transaction
    pub fn end_transaction(&self) -> StorageResult<()> {
        self.execute_non_query("COMMIT;")
    }

    pub(crate) fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnection").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DbConnection::open(MEMORY_DB, &StorageConfig::default()).unwrap();
        db.execute_non_query("CREATE TABLE t(id INTEGER PRIMARY KEY, v INTEGER);")
            .unwrap();
        db.execute_non_query("INSERT INTO t VALUES(NULL, 7);").unwrap();
        assert_eq!(db.last_inserted_row_id(), 1);
        db.close().unwrap();
    }

    #[test]
    fn test_flat_transaction_commits() {
        let db = DbConnection::open(MEMORY_DB, &StorageConfig::default()).unwrap();
        db.execute_non_query("CREATE TABLE t(id INTEGER PRIMARY KEY);")
            .unwrap();
        db.start_transaction().unwrap();
        db.execute_non_query("INSERT INTO t VALUES(NULL);").unwrap();
        db.end_transaction().unwrap();
        assert_eq!(db.last_inserted_row_id(), 1);
    }
}
