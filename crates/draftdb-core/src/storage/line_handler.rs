//! Storage handler for line entities

use tracing::error;

use crate::error::{StorageError, StorageResult};
use crate::geometry::Vector3;
use crate::objects::{Line, ObjectId, ObjectTypeId, StoredObject, OBJECT_TYPE_LINE};
use crate::storage::command::DbCommand;
use crate::storage::connection::DbConnection;
use crate::storage::entity_handler::EntityHandler;
use crate::storage::handler::ObjectTypeHandler;

/// Handler for the `Line` table. Chains through the entity handler for
/// the shared entity and base object rows.
#[derive(Debug, Default)]
pub struct LineHandler {
    entity: EntityHandler,
}

impl LineHandler {
    pub fn new() -> Self {
        Self {
            entity: EntityHandler::new(),
        }
    }
}

impl ObjectTypeHandler for LineHandler {
    fn object_type_id(&self) -> ObjectTypeId {
        OBJECT_TYPE_LINE
    }

    fn init_db(&self, db: &DbConnection) -> StorageResult<()> {
        self.entity.init_db(db)?;

        db.execute_non_query(
            "CREATE TABLE IF NOT EXISTS Line(\
                id INT PRIMARY KEY, \
                x1 REAL, \
                y1 REAL, \
                z1 REAL, \
                x2 REAL, \
                y2 REAL, \
                z2 REAL\
            );",
        )
    }

    fn load_object(&self, db: &DbConnection, object_id: ObjectId) -> StorageResult<StoredObject> {
        let mut object = StoredObject::Line(Line::default());
        self.load_into(db, &mut object, object_id)?;
        Ok(object)
    }

    fn load_into(
        &self,
        db: &DbConnection,
        object: &mut StoredObject,
        object_id: ObjectId,
    ) -> StorageResult<()> {
        self.entity.load_into(db, object, object_id)?;

        let Some(line) = object.as_line_mut() else {
            error!(object_id, "given object is not a line");
            return Ok(());
        };

        let mut cmd = DbCommand::new(db, "SELECT x1,y1,z1,x2,y2,z2 FROM Line WHERE id=?")?;
        cmd.bind_i64(1, object_id)?;
        let mut reader = cmd.query();
        match reader.step()? {
            Some(row) => {
                line.start_point =
                    Vector3::new(row.get_f64(0)?, row.get_f64(1)?, row.get_f64(2)?);
                line.end_point = Vector3::new(row.get_f64(3)?, row.get_f64(4)?, row.get_f64(5)?);
            }
            None => {
                error!(object_id, "cannot read line data");
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
            // parent rows first: assigns the id the Line row references
            self.entity.save_object(db, object, true)?;

            let Some(line) = object.as_line() else {
                return Err(StorageError::TypeMismatch {
                    object_id: object.id(),
                    expected: "line",
                });
            };

            let mut cmd = DbCommand::new(db, "INSERT INTO Line VALUES(?,?,?,?,?,?,?)")?;
            cmd.bind_i64(1, line.id())?;
            cmd.bind_f64(2, line.start_point.x)?;
            cmd.bind_f64(3, line.start_point.y)?;
            cmd.bind_f64(4, line.start_point.z)?;
            cmd.bind_f64(5, line.end_point.x)?;
            cmd.bind_f64(6, line.end_point.y)?;
            cmd.bind_f64(7, line.end_point.z)?;
            cmd.execute_non_query()?;
        } else {
            let Some(line) = object.as_line() else {
                return Err(StorageError::TypeMismatch {
                    object_id: object.id(),
                    expected: "line",
                });
            };

            let mut cmd = DbCommand::new(
                db,
                "UPDATE Line SET x1=?, y1=?, z1=?, x2=?, y2=?, z2=? WHERE id=?",
            )?;
            cmd.bind_f64(1, line.start_point.x)?;
            cmd.bind_f64(2, line.start_point.y)?;
            cmd.bind_f64(3, line.start_point.z)?;
            cmd.bind_f64(4, line.end_point.x)?;
            cmd.bind_f64(5, line.end_point.y)?;
            cmd.bind_f64(6, line.end_point.z)?;
            cmd.bind_i64(7, line.id())?;
            cmd.execute_non_query()?;

            self.entity.save_object(db, object, false)?;
        }
        Ok(())
    }

    fn delete_object(&self, db: &DbConnection, object_id: ObjectId) -> StorageResult<()> {
        let mut cmd = DbCommand::new(db, "DELETE FROM Line WHERE id=?")?;
        cmd.bind_i64(1, object_id)?;
        cmd.execute_non_query()?;

        self.entity.delete_object(db, object_id)
    }
}
