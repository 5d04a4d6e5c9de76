//! Document storage
//!
//! SQLite-backed persistence for CAD documents: objects, the transaction
//! log, and the entity selection state.
//!
//! # Architecture
//!
//! The storage layer is organized into several submodules:
//!
//! - [`engine`]: the top-level [`DocumentStorage`] facade
//! - [`connection`]: typed wrapper around the SQLite connection
//! - [`command`]: prepared statements and row readers
//! - [`handler`]: the capability trait each storable type implements
//! - [`registry`]: process-scoped map from object-type id to handler
//! - [`object_handler`]: the generic `Object` row every type extends
//! - [`entity_handler`]: the `Entity` row and set-at-a-time selection
//! - [`line_handler`], [`ucs_handler`]: the built-in concrete types
//! - [`transaction_log`]: change-set value objects for undo/redo
//!
//! # Example
//!
//! ```ignore
//! use draftdb_core::{DocumentStorage, Line, StoredObject, Vector3};
//! use draftdb_core::storage::registry;
//!
//! registry::register_standard_object_types();
//! let storage = DocumentStorage::open(":memory:")?;
//!
//! let mut line = StoredObject::from(Line::new(
//!     Vector3::ZERO,
//!     Vector3::new(10.0, 0.0, 0.0),
//! ));
//! storage.save_object(&mut line)?;
//! assert_eq!(line.id(), 1);
//! ```

// Submodules
pub mod command;
pub mod connection;
pub mod engine;
pub mod entity_handler;
pub mod handler;
pub mod line_handler;
pub mod object_handler;
pub mod registry;
pub mod transaction_log;
pub mod ucs_handler;

// Re-exports from submodules for convenient access

// Facade
pub use engine::DocumentStorage;
// Connection facade
pub use connection::{DbConnection, StorageConfig, MEMORY_DB};
// Prepared statements
pub use command::{DbCommand, DbReader, DbRow};
// Handler chain
pub use entity_handler::EntityHandler;
pub use handler::ObjectTypeHandler;
pub use line_handler::LineHandler;
pub use object_handler::ObjectHandler;
pub use ucs_handler::UcsHandler;
// Transaction log
pub use transaction_log::{
    PropertyChange, PropertyDataType, PropertyTypeId, PropertyValue, Transaction, TransactionId,
};

use std::collections::BTreeSet;

use crate::objects::ObjectId;

/// Format a set of ids as an SQL list for `IN` expressions, e.g.
/// `"(1,7,15)"`. The empty set yields `"()"`, which is not valid SQL;
/// callers must special-case it.
pub fn sql_id_list(ids: &BTreeSet<ObjectId>) -> String {
    let mut result = String::from("(");
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            result.push(',');
        }
        result.push_str(&id.to_string());
    }
    result.push(')');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_id_list() {
        let ids: BTreeSet<ObjectId> = [7, 1, 15].into_iter().collect();
        assert_eq!(sql_id_list(&ids), "(1,7,15)");
        assert_eq!(sql_id_list(&BTreeSet::new()), "()");
    }
}
