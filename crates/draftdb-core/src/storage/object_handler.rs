//! Base object handler
//!
//! Every storable type extends the generic `Object` row: the persistent
//! id, the object-type id that selects the handler, and the undo bit that
//! hides an object from live queries without removing it.

use std::collections::BTreeSet;

use crate::error::StorageResult;
use crate::objects::{ObjectId, StoredObject};
use crate::storage::command::DbCommand;
use crate::storage::connection::DbConnection;

/// Handler for the generic `Object` row.
#[derive(Debug, Default)]
pub struct ObjectHandler;

impl ObjectHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn init_db(&self, db: &DbConnection) -> StorageResult<()> {
        db.execute_non_query(
            "CREATE TABLE IF NOT EXISTS Object(\
                id INTEGER PRIMARY KEY, \
                objectTypeId INTEGER, \
                undoStatus INTEGER\
            );",
        )
    }

    pub fn load_into(
        &self,
        _db: &DbConnection,
        object: &mut StoredObject,
        object_id: ObjectId,
    ) -> StorageResult<()> {
        // nothing to load at this level beyond the id
        object.set_id(object_id);
        Ok(())
    }

    /// Insert the base row for a new object and assign its id from the
    /// driver. Existing objects have no update work at this level.
    pub fn save_object(
        &self,
        db: &DbConnection,
        object: &mut StoredObject,
        is_new: bool,
    ) -> StorageResult<()> {
        if is_new {
            let mut cmd = DbCommand::new(db, "INSERT INTO Object VALUES(?,?,?)")?;
            cmd.bind_null(1)?;
            cmd.bind_i64(2, object.object_type_id())?;
            cmd.bind_i64(3, 0)?;
            cmd.execute_non_query()?;
            object.set_id(db.last_inserted_row_id());
        }
        Ok(())
    }

    pub fn delete_object(&self, db: &DbConnection, object_id: ObjectId) -> StorageResult<()> {
        let mut cmd = DbCommand::new(db, "DELETE FROM Object WHERE id=?")?;
        cmd.bind_i64(1, object_id)?;
        cmd.execute_non_query()?;
        Ok(())
    }

    /// Ids of all live objects of any type.
    pub fn query_all_objects(db: &DbConnection) -> StorageResult<BTreeSet<ObjectId>> {
        let mut cmd = DbCommand::new(db, "SELECT id FROM Object WHERE undoStatus=0")?;
        let mut reader = cmd.query();
        let mut result = BTreeSet::new();
        while let Some(row) = reader.step()? {
            result.insert(row.get_i64(0)?);
        }
        Ok(result)
    }
}
