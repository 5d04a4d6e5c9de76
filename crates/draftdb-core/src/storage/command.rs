//! Prepared commands and row readers
//!
//! [`DbCommand`] wraps a prepared statement with 1-based positional
//! parameter binding, matching the underlying driver's indices. A command
//! is a locally-scoped resource: the statement handle is released when the
//! command goes out of scope, on every exit path.

use rusqlite::types::Null;

use crate::error::StorageResult;
use crate::storage::connection::DbConnection;

/// A prepared SQL statement with typed positional parameters.
pub struct DbCommand<'conn> {
    stmt: rusqlite::Statement<'conn>,
}

impl<'conn> DbCommand<'conn> {
    /// Prepare `sql` on the given connection.
    pub fn new(db: &'conn DbConnection, sql: &str) -> StorageResult<Self> {
        Ok(Self {
            stmt: db.raw().prepare(sql)?,
        })
    }

    /// Bind a 32-bit integer to the 1-based parameter `index`.
    pub fn bind_int(&mut self, index: usize, value: i32) -> StorageResult<()> {
        self.stmt.raw_bind_parameter(index, value)?;
        Ok(())
    }

    /// Bind a 64-bit integer to the 1-based parameter `index`.
    pub fn bind_i64(&mut self, index: usize, value: i64) -> StorageResult<()> {
        self.stmt.raw_bind_parameter(index, value)?;
        Ok(())
    }

    /// Bind a double to the 1-based parameter `index`.
    pub fn bind_f64(&mut self, index: usize, value: f64) -> StorageResult<()> {
        self.stmt.raw_bind_parameter(index, value)?;
        Ok(())
    }

    /// Bind a string to the 1-based parameter `index`.
    pub fn bind_text(&mut self, index: usize, value: &str) -> StorageResult<()> {
        self.stmt.raw_bind_parameter(index, value)?;
        Ok(())
    }

    /// Bind a boolean (stored as `0`/`1`) to the 1-based parameter
    /// `index`.
    pub fn bind_bool(&mut self, index: usize, value: bool) -> StorageResult<()> {
        self.stmt.raw_bind_parameter(index, value)?;
        Ok(())
    }

    /// Bind SQL `NULL` to the 1-based parameter `index`.
    pub fn bind_null(&mut self, index: usize) -> StorageResult<()> {
        self.stmt.raw_bind_parameter(index, Null)?;
        Ok(())
    }

    /// Execute a statement that returns no rows; yields the number of
    /// affected rows.
    pub fn execute_non_query(&mut self) -> StorageResult<usize> {
        Ok(self.stmt.raw_execute()?)
    }

    /// Execute a scalar query and return the integer in the first column
    /// of the first row.
    pub fn execute_int(&mut self) -> StorageResult<i64> {
        let mut rows = self.stmt.raw_query();
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Err(rusqlite::Error::QueryReturnedNoRows.into()),
        }
    }

    /// Execute a scalar query and return the string in the first column
    /// of the first row.
    pub fn execute_string(&mut self) -> StorageResult<String> {
        let mut rows = self.stmt.raw_query();
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Err(rusqlite::Error::QueryReturnedNoRows.into()),
        }
    }

    /// Execute the statement and return a row reader.
    pub fn query(&mut self) -> DbReader<'_> {
        DbReader {
            rows: self.stmt.raw_query(),
        }
    }
}

/// Iterator over the rows produced by a [`DbCommand`] query.
pub struct DbReader<'stmt> {
    rows: rusqlite::Rows<'stmt>,
}

impl DbReader<'_> {
    /// Advance to the next row; `None` when the result set is exhausted.
    pub fn step(&mut self) -> StorageResult<Option<DbRow<'_>>> {
        Ok(self.rows.next()?.map(|row| DbRow { row }))
    }
}

/// One result row with positional typed column access (0-based).
pub struct DbRow<'a> {
    row: &'a rusqlite::Row<'a>,
}

impl DbRow<'_> {
    pub fn get_i64(&self, column: usize) -> StorageResult<i64> {
        Ok(self.row.get(column)?)
    }

    pub fn get_f64(&self, column: usize) -> StorageResult<f64> {
        Ok(self.row.get(column)?)
    }

    pub fn get_bool(&self, column: usize) -> StorageResult<bool> {
        Ok(self.row.get(column)?)
    }

    pub fn get_string(&self, column: usize) -> StorageResult<String> {
        Ok(self.row.get(column)?)
    }

    /// Integer column that may be NULL (aggregates over empty tables).
    pub fn get_opt_i64(&self, column: usize) -> StorageResult<Option<i64>> {
        Ok(self.row.get(column)?)
    }

    /// Real column that may be NULL (aggregates over empty tables).
    pub fn get_opt_f64(&self, column: usize) -> StorageResult<Option<f64>> {
        Ok(self.row.get(column)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::connection::{StorageConfig, MEMORY_DB};

    fn test_db() -> DbConnection {
        let db = DbConnection::open(MEMORY_DB, &StorageConfig::default()).unwrap();
        db.execute_non_query("CREATE TABLE t(i INTEGER, d REAL, s TEXT, b INTEGER);")
            .unwrap();
        db
    }

    #[test]
    fn test_bind_and_read_back() {
        let db = test_db();

        let mut cmd = DbCommand::new(&db, "INSERT INTO t VALUES(?,?,?,?)").unwrap();
        cmd.bind_i64(1, 42).unwrap();
        cmd.bind_f64(2, 2.5).unwrap();
        cmd.bind_text(3, "hello").unwrap();
        cmd.bind_bool(4, true).unwrap();
        cmd.execute_non_query().unwrap();

        let mut cmd = DbCommand::new(&db, "SELECT i, d, s, b FROM t").unwrap();
        let mut reader = cmd.query();
        let row = reader.step().unwrap().expect("one row");
        assert_eq!(row.get_i64(0).unwrap(), 42);
        assert_eq!(row.get_f64(1).unwrap(), 2.5);
        assert_eq!(row.get_string(2).unwrap(), "hello");
        assert!(row.get_bool(3).unwrap());
        assert!(reader.step().unwrap().is_none());
    }

    #[test]
    fn test_scalar_helpers() {
        let db = test_db();
        let mut cmd = DbCommand::new(&db, "INSERT INTO t VALUES(?,?,?,?)").unwrap();
        cmd.bind_i64(1, 7).unwrap();
        cmd.bind_null(2).unwrap();
        cmd.bind_text(3, "x").unwrap();
        cmd.bind_bool(4, false).unwrap();
        cmd.execute_non_query().unwrap();

        let mut cmd = DbCommand::new(&db, "SELECT i FROM t").unwrap();
        assert_eq!(cmd.execute_int().unwrap(), 7);

        let mut cmd = DbCommand::new(&db, "SELECT s FROM t").unwrap();
        assert_eq!(cmd.execute_string().unwrap(), "x");
    }

    #[test]
    fn test_scalar_on_empty_result_is_an_error() {
        let db = test_db();
        let mut cmd = DbCommand::new(&db, "SELECT i FROM t WHERE i = 99").unwrap();
        assert!(cmd.execute_int().is_err());
    }

    #[test]
    fn test_null_aggregate_reads_as_none() {
        let db = test_db();
        let mut cmd = DbCommand::new(&db, "SELECT max(i) FROM t").unwrap();
        let mut reader = cmd.query();
        let row = reader.step().unwrap().expect("aggregate row");
        assert_eq!(row.get_opt_i64(0).unwrap(), None);
    }
}
