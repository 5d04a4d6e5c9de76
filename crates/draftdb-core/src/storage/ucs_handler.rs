//! Storage handler for user coordinate systems
//!
//! Coordinate systems are not drawing entities: the handler chains
//! directly into the base object handler and owns the `Ucs` table with
//! the origin and the two axis directions.

use std::collections::BTreeSet;

use tracing::error;

use crate::error::{StorageError, StorageResult};
use crate::geometry::Vector3;
use crate::objects::{ObjectId, ObjectTypeId, StoredObject, Ucs, OBJECT_TYPE_UCS};
use crate::storage::command::DbCommand;
use crate::storage::connection::DbConnection;
use crate::storage::handler::ObjectTypeHandler;
use crate::storage::object_handler::ObjectHandler;

/// Handler for the `Ucs` table.
#[derive(Debug, Default)]
pub struct UcsHandler {
    object: ObjectHandler,
}

impl UcsHandler {
    pub fn new() -> Self {
        Self {
            object: ObjectHandler::new(),
        }
    }

    /// Ids of all live coordinate systems.
    pub fn query_all_ucs(db: &DbConnection) -> StorageResult<BTreeSet<ObjectId>> {
        let mut cmd = DbCommand::new(
            db,
            "SELECT id FROM Object WHERE objectTypeId=? AND undoStatus=0",
        )?;
        cmd.bind_i64(1, OBJECT_TYPE_UCS)?;
        let mut reader = cmd.query();
        let mut result = BTreeSet::new();
        while let Some(row) = reader.step()? {
            result.insert(row.get_i64(0)?);
        }
        Ok(result)
    }
}

impl ObjectTypeHandler for UcsHandler {
    fn object_type_id(&self) -> ObjectTypeId {
        OBJECT_TYPE_UCS
    }

    fn init_db(&self, db: &DbConnection) -> StorageResult<()> {
        self.object.init_db(db)?;

        db.execute_non_query(
            "CREATE TABLE IF NOT EXISTS Ucs(\
                id INTEGER PRIMARY KEY, \
                originX REAL, \
                originY REAL, \
                originZ REAL, \
                xAxisDirectionX REAL, \
                xAxisDirectionY REAL, \
                xAxisDirectionZ REAL, \
                yAxisDirectionX REAL, \
                yAxisDirectionY REAL, \
                yAxisDirectionZ REAL\
            );",
        )
    }

    fn load_object(&self, db: &DbConnection, object_id: ObjectId) -> StorageResult<StoredObject> {
        let mut object = StoredObject::Ucs(Ucs::default());
        self.load_into(db, &mut object, object_id)?;
        Ok(object)
    }

    fn load_into(
        &self,
        db: &DbConnection,
        object: &mut StoredObject,
        object_id: ObjectId,
    ) -> StorageResult<()> {
        self.object.load_into(db, object, object_id)?;

        let Some(ucs) = object.as_ucs_mut() else {
            error!(object_id, "given object is not a ucs");
            return Ok(());
        };

        let mut cmd = DbCommand::new(
            db,
            "SELECT originX,originY,originZ, \
                    xAxisDirectionX,xAxisDirectionY,xAxisDirectionZ, \
                    yAxisDirectionX,yAxisDirectionY,yAxisDirectionZ \
             FROM Ucs WHERE id=?",
        )?;
        cmd.bind_i64(1, object_id)?;
        let mut reader = cmd.query();
        match reader.step()? {
            Some(row) => {
                ucs.origin = Vector3::new(row.get_f64(0)?, row.get_f64(1)?, row.get_f64(2)?);
                ucs.x_axis_direction =
                    Vector3::new(row.get_f64(3)?, row.get_f64(4)?, row.get_f64(5)?);
                ucs.y_axis_direction =
                    Vector3::new(row.get_f64(6)?, row.get_f64(7)?, row.get_f64(8)?);
            }
            None => {
                error!(object_id, "cannot read ucs data");
            }
        }
        Ok(())
    }

    fn save_object(
        &self,
        db: &DbConnection,
        object: &mut StoredObject,
        is_new: bool,
    ) -> StorageResult<()> {
        if is_new {
            self.object.save_object(db, object, true)?;

            let Some(ucs) = object.as_ucs() else {
                return Err(StorageError::TypeMismatch {
                    object_id: object.id(),
                    expected: "ucs",
                });
            };

            let mut cmd = DbCommand::new(db, "INSERT INTO Ucs VALUES(?, ?,?,?, ?,?,?, ?,?,?)")?;
            cmd.bind_i64(1, ucs.id())?;
            cmd.bind_f64(2, ucs.origin.x)?;
            cmd.bind_f64(3, ucs.origin.y)?;
            cmd.bind_f64(4, ucs.origin.z)?;
            cmd.bind_f64(5, ucs.x_axis_direction.x)?;
            cmd.bind_f64(6, ucs.x_axis_direction.y)?;
            cmd.bind_f64(7, ucs.x_axis_direction.z)?;
            cmd.bind_f64(8, ucs.y_axis_direction.x)?;
            cmd.bind_f64(9, ucs.y_axis_direction.y)?;
            cmd.bind_f64(10, ucs.y_axis_direction.z)?;
            cmd.execute_non_query()?;
        } else {
            let Some(ucs) = object.as_ucs() else {
                return Err(StorageError::TypeMismatch {
                    object_id: object.id(),
                    expected: "ucs",
                });
            };

            let mut cmd = DbCommand::new(
                db,
                "UPDATE Ucs \
                 SET originX=?, originY=?, originZ=?, \
                     xAxisDirectionX=?, xAxisDirectionY=?, xAxisDirectionZ=?, \
                     yAxisDirectionX=?, yAxisDirectionY=?, yAxisDirectionZ=? \
                 WHERE id=?",
            )?;
            cmd.bind_f64(1, ucs.origin.x)?;
            cmd.bind_f64(2, ucs.origin.y)?;
            cmd.bind_f64(3, ucs.origin.z)?;
            cmd.bind_f64(4, ucs.x_axis_direction.x)?;
            cmd.bind_f64(5, ucs.x_axis_direction.y)?;
            cmd.bind_f64(6, ucs.x_axis_direction.z)?;
            cmd.bind_f64(7, ucs.y_axis_direction.x)?;
            cmd.bind_f64(8, ucs.y_axis_direction.y)?;
            cmd.bind_f64(9, ucs.y_axis_direction.z)?;
            cmd.bind_i64(10, ucs.id())?;
            cmd.execute_non_query()?;

            self.object.save_object(db, object, false)?;
        }
        Ok(())
    }

    fn delete_object(&self, db: &DbConnection, object_id: ObjectId) -> StorageResult<()> {
        let mut cmd = DbCommand::new(db, "DELETE FROM Ucs WHERE id=?")?;
        cmd.bind_i64(1, object_id)?;
        cmd.execute_non_query()?;

        self.object.delete_object(db, object_id)
    }
}
