//! Entity handler and selection primitives
//!
//! Superclass handler of all drawing entities: owns the `Entity` table
//! with the selection flag and the bounding-box columns, and provides the
//! set-at-a-time selection operations used by the storage facade.
//!
//! Selection toggles are issued as single SQL updates, never row-by-row
//! loops. The set of affected ids is computed from the pre-update state
//! with the same predicate the update uses, so it always equals the
//! symmetric difference of the selection before and after the call.

use std::collections::BTreeSet;

use tracing::error;

use crate::error::StorageResult;
use crate::geometry::{BoundingBox, Vector3};
use crate::objects::{ObjectId, StoredObject, FIRST_ENTITY_TYPE_ID};
use crate::storage::command::DbCommand;
use crate::storage::connection::DbConnection;
use crate::storage::object_handler::ObjectHandler;
use crate::storage::sql_id_list;

/// Handler for the `Entity` row shared by all drawing entities.
#[derive(Debug, Default)]
pub struct EntityHandler {
    object: ObjectHandler,
}

impl EntityHandler {
    pub fn new() -> Self {
        Self {
            object: ObjectHandler::new(),
        }
    }

    pub fn init_db(&self, db: &DbConnection) -> StorageResult<()> {
        self.object.init_db(db)?;

        db.execute_non_query(
            "CREATE TABLE IF NOT EXISTS Entity(\
                id INTEGER PRIMARY KEY, \
                selectionStatus INTEGER, \
                minX REAL, \
                minY REAL, \
                minZ REAL, \
                maxX REAL, \
                maxY REAL, \
                maxZ REAL\
            );",
        )
    }

    pub fn load_into(
        &self,
        db: &DbConnection,
        object: &mut StoredObject,
        object_id: ObjectId,
    ) -> StorageResult<()> {
        self.object.load_into(db, object, object_id)?;

        let mut cmd = DbCommand::new(db, "SELECT selectionStatus FROM Entity WHERE id=?")?;
        cmd.bind_i64(1, object_id)?;
        let mut reader = cmd.query();
        match reader.step()? {
            Some(row) => {
                let selected = row.get_bool(0)?;
                object.set_selection_status(selected);
            }
            None => {
                error!(entity_id = object_id, "cannot read entity data");
            }
        }
        Ok(())
    }

    pub fn save_object(
        &self,
        db: &DbConnection,
        object: &mut StoredObject,
        is_new: bool,
    ) -> StorageResult<()> {
        if is_new {
            // the base row must exist first so the id is assigned
            self.object.save_object(db, object, true)?;

            let bbox = object.bounding_box().unwrap_or_default();
            let mut cmd = DbCommand::new(db, "INSERT INTO Entity VALUES(?,?,?,?,?,?,?,?)")?;
            cmd.bind_i64(1, object.id())?;
            cmd.bind_bool(2, object.selection_status().unwrap_or(false))?;
            bind_box(&mut cmd, 3, &bbox)?;
            cmd.execute_non_query()?;
        } else {
            let bbox = object.bounding_box().unwrap_or_default();
            let mut cmd = DbCommand::new(
                db,
                "UPDATE Entity \
                 SET selectionStatus=?, minX=?, minY=?, minZ=?, maxX=?, maxY=?, maxZ=? \
                 WHERE id=?",
            )?;
            cmd.bind_bool(1, object.selection_status().unwrap_or(false))?;
            bind_box(&mut cmd, 2, &bbox)?;
            cmd.bind_i64(8, object.id())?;
            cmd.execute_non_query()?;

            self.object.save_object(db, object, false)?;
        }
        Ok(())
    }

    pub fn delete_object(&self, db: &DbConnection, object_id: ObjectId) -> StorageResult<()> {
        let mut cmd = DbCommand::new(db, "DELETE FROM Entity WHERE id=?")?;
        cmd.bind_i64(1, object_id)?;
        cmd.execute_non_query()?;

        self.object.delete_object(db, object_id)
    }

    /// Ids of all live drawing entities.
    pub fn query_all_entities(db: &DbConnection) -> StorageResult<BTreeSet<ObjectId>> {
        let mut cmd = DbCommand::new(
            db,
            "SELECT id FROM Object WHERE objectTypeId>=? AND undoStatus=0",
        )?;
        cmd.bind_i64(1, FIRST_ENTITY_TYPE_ID)?;
        collect_ids(cmd)
    }

    /// Ids of all live entities that are currently selected.
    pub fn query_selected_entities(db: &DbConnection) -> StorageResult<BTreeSet<ObjectId>> {
        let cmd = DbCommand::new(
            db,
            "SELECT Entity.id FROM Entity, Object \
             WHERE Entity.id=Object.id AND selectionStatus=1 AND undoStatus=0",
        )?;
        collect_ids(cmd)
    }

    /// Deselect every selected entity. Ids whose state changes are added
    /// to `affected` before the update runs.
    pub fn clear_entity_selection(
        db: &DbConnection,
        affected: Option<&mut BTreeSet<ObjectId>>,
    ) -> StorageResult<()> {
        if let Some(affected) = affected {
            let cmd = DbCommand::new(db, "SELECT id FROM Entity WHERE selectionStatus=1")?;
            affected.append(&mut collect_ids(cmd)?);
        }

        let mut cmd =
            DbCommand::new(db, "UPDATE Entity SET selectionStatus=0 WHERE selectionStatus=1")?;
        cmd.execute_non_query()?;
        Ok(())
    }

    /// Select one entity. With `add` the entity joins the current
    /// selection (idempotent, affected set `{entity_id}`); without `add`
    /// the selection becomes exactly `{entity_id}` and the affected set is
    /// the symmetric difference against the previous selection.
    pub fn select_entity(
        db: &DbConnection,
        entity_id: ObjectId,
        add: bool,
        affected: Option<&mut BTreeSet<ObjectId>>,
    ) -> StorageResult<()> {
        if add {
            if let Some(affected) = affected {
                affected.insert(entity_id);
            }

            let mut cmd = DbCommand::new(db, "UPDATE Entity SET selectionStatus=1 WHERE id=?")?;
            cmd.bind_i64(1, entity_id)?;
            cmd.execute_non_query()?;
            return Ok(());
        }

        // exclusive selection: the target becomes selected, everything
        // else deselected, in one toggle over the changing rows
        if let Some(affected) = affected {
            let mut cmd = DbCommand::new(
                db,
                "SELECT id FROM Entity \
                 WHERE (id=? AND selectionStatus=0) OR (id!=? AND selectionStatus=1)",
            )?;
            cmd.bind_i64(1, entity_id)?;
            cmd.bind_i64(2, entity_id)?;
            affected.append(&mut collect_ids(cmd)?);
        }

        let mut cmd = DbCommand::new(
            db,
            "UPDATE Entity SET selectionStatus=NOT(selectionStatus) \
             WHERE (id=? AND selectionStatus=0) OR (id!=? AND selectionStatus=1)",
        )?;
        cmd.bind_i64(1, entity_id)?;
        cmd.bind_i64(2, entity_id)?;
        cmd.execute_non_query()?;
        Ok(())
    }

    /// Select a set of entities. With `add` every id in `entity_ids`
    /// joins the selection; without `add` the selection becomes exactly
    /// `entity_ids`. The affected set is the symmetric difference of the
    /// selection before and after the call.
    pub fn select_entities(
        db: &DbConnection,
        entity_ids: &BTreeSet<ObjectId>,
        add: bool,
        affected: Option<&mut BTreeSet<ObjectId>>,
    ) -> StorageResult<()> {
        if entity_ids.is_empty() {
            // "()" is not a valid IN list; an empty exclusive selection
            // is a plain clear, an empty additive selection a no-op
            if add {
                return Ok(());
            }
            return Self::clear_entity_selection(db, affected);
        }

        let id_list = sql_id_list(entity_ids);

        if add {
            if let Some(affected) = affected {
                affected.extend(entity_ids.iter().copied());
            }

            let mut cmd = DbCommand::new(
                db,
                &format!("UPDATE Entity SET selectionStatus=1 WHERE id IN {id_list}"),
            )?;
            cmd.execute_non_query()?;
            return Ok(());
        }

        let predicate = format!(
            "(id IN {id_list} AND selectionStatus=0) OR (id NOT IN {id_list} AND selectionStatus=1)"
        );

        if let Some(affected) = affected {
            let cmd = DbCommand::new(db, &format!("SELECT id FROM Entity WHERE {predicate}"))?;
            affected.append(&mut collect_ids(cmd)?);
        }

        let mut cmd = DbCommand::new(
            db,
            &format!("UPDATE Entity SET selectionStatus=NOT(selectionStatus) WHERE {predicate}"),
        )?;
        cmd.execute_non_query()?;
        Ok(())
    }

    /// Componentwise min/max over the bounding boxes of all live
    /// entities; the degenerate box at the origin when there are none.
    pub fn bounding_box(db: &DbConnection) -> StorageResult<BoundingBox> {
        let mut cmd = DbCommand::new(
            db,
            "SELECT min(minX), min(minY), min(minZ), max(maxX), max(maxY), max(maxZ) \
             FROM Entity, Object \
             WHERE Entity.id=Object.id AND undoStatus=0",
        )?;
        let mut reader = cmd.query();
        let Some(row) = reader.step()? else {
            return Ok(BoundingBox::degenerate());
        };

        let min_x = row.get_opt_f64(0)?;
        let min_y = row.get_opt_f64(1)?;
        let min_z = row.get_opt_f64(2)?;
        let max_x = row.get_opt_f64(3)?;
        let max_y = row.get_opt_f64(4)?;
        let max_z = row.get_opt_f64(5)?;

        match (min_x, min_y, min_z, max_x, max_y, max_z) {
            (Some(x0), Some(y0), Some(z0), Some(x1), Some(y1), Some(z1)) => Ok(BoundingBox {
                min: Vector3::new(x0, y0, z0),
                max: Vector3::new(x1, y1, z1),
            }),
            _ => Ok(BoundingBox::degenerate()),
        }
    }
}

fn bind_box(cmd: &mut DbCommand<'_>, first_index: usize, bbox: &BoundingBox) -> StorageResult<()> {
    cmd.bind_f64(first_index, bbox.min.x)?;
    cmd.bind_f64(first_index + 1, bbox.min.y)?;
    cmd.bind_f64(first_index + 2, bbox.min.z)?;
    cmd.bind_f64(first_index + 3, bbox.max.x)?;
    cmd.bind_f64(first_index + 4, bbox.max.y)?;
    cmd.bind_f64(first_index + 5, bbox.max.z)?;
    Ok(())
}

fn collect_ids(mut cmd: DbCommand<'_>) -> StorageResult<BTreeSet<ObjectId>> {
    let mut reader = cmd.query();
    let mut result = BTreeSet::new();
    while let Some(row) = reader.step()? {
        result.insert(row.get_i64(0)?);
    }
    Ok(result)
}
