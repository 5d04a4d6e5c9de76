//! Error types for the document store
//!
//! The taxonomy distinguishes fatal schema failures, recoverable dispatch
//! problems (unknown object type, type mismatch), and generic SQL driver
//! errors, which are surfaced to the caller unchanged.

use thiserror::Error;

use crate::objects::{ObjectId, ObjectTypeId};

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by the document store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A DDL statement failed while bootstrapping the database. Fatal.
    #[error("schema initialization failed: {0}")]
    Schema(String),

    /// An object carries a type id with no registered handler. Reads
    /// recover from this by returning absent; writes surface it.
    #[error("no storage handler registered for object type {0}")]
    UnknownObjectType(ObjectTypeId),

    /// A handler was asked to save an object of the wrong shape.
    #[error("object {object_id} is not a {expected}")]
    TypeMismatch {
        object_id: ObjectId,
        expected: &'static str,
    },

    /// Any other failure from the SQL driver.
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
}
