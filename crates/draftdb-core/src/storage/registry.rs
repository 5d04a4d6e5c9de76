//! Process-scoped object-type registry
//!
//! Maps an object-type id to the single handler instance for that type.
//! The registry is populated during application startup, before the first
//! storage instance opens a database, and is read-mostly afterwards.
//! Registration is first-wins: a duplicate type id is logged and ignored.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::error;

use crate::error::StorageResult;
use crate::objects::{ObjectTypeId, OBJECT_TYPE_LINE, OBJECT_TYPE_UCS};
use crate::storage::connection::DbConnection;
use crate::storage::handler::ObjectTypeHandler;
use crate::storage::line_handler::LineHandler;
use crate::storage::ucs_handler::UcsHandler;

static HANDLERS: RwLock<BTreeMap<ObjectTypeId, Arc<dyn ObjectTypeHandler>>> =
    RwLock::new(BTreeMap::new());

/// Register a handler for `object_type_id`. The first registration of a
/// type id wins; duplicates are logged and ignored.
pub fn register_object_type(object_type_id: ObjectTypeId, handler: Arc<dyn ObjectTypeHandler>) {
    let mut handlers = HANDLERS.write().unwrap();
    match handlers.entry(object_type_id) {
        Entry::Vacant(entry) => {
            entry.insert(handler);
        }
        Entry::Occupied(_) => {
            error!(object_type_id, "duplicate object type registration ignored");
        }
    }
}

/// The handler registered for `object_type_id`, if any.
pub fn handler_for(object_type_id: ObjectTypeId) -> Option<Arc<dyn ObjectTypeHandler>> {
    HANDLERS.read().unwrap().get(&object_type_id).cloned()
}

/// Initialize the tables of all registered types. Handlers run in
/// ascending type-id order so the emitted DDL is reproducible.
pub fn init_db(db: &DbConnection) -> StorageResult<()> {
    let handlers = HANDLERS.read().unwrap();
    for handler in handlers.values() {
        handler.init_db(db)?;
    }
    Ok(())
}

/// Register the built-in object types (coordinate system, line).
/// Applications may register further types before the first database is
/// opened. Safe to call more than once.
pub fn register_standard_object_types() {
    if handler_for(OBJECT_TYPE_UCS).is_none() {
        register_object_type(OBJECT_TYPE_UCS, Arc::new(UcsHandler::new()));
    }
    if handler_for(OBJECT_TYPE_LINE).is_none() {
        register_object_type(OBJECT_TYPE_LINE, Arc::new(LineHandler::new()));
    }
}

/// Release all handlers. Call at process teardown, after the last storage
/// instance is gone.
pub fn clean_up() {
    HANDLERS.write().unwrap().clear();
}
