//! Document storage facade
//!
//! [`DocumentStorage`] stores one CAD document in an SQLite database.
//!
//! The database uses the following tables:
//!
//! - **Object**: data common to all object types.
//!   - `id`: object id.
//!   - `objectTypeId`: type tag selecting the storage handler.
//!   - `undoStatus`: 1 for objects that are undone (and therefore
//!     invisible), 0 for normal objects.
//! - **Entity**: data common to all drawing entities (`selectionStatus`
//!   and the bounding-box columns). Type-specific data lives in one table
//!   per type, e.g. `Line` for line entities and `Ucs` for coordinate
//!   systems.
//! - **Transaction2**: the transaction log used for undo/redo. (`Transaction`
//!   is a reserved keyword.)
//! - **AffectedObjects**: links every log entry with the objects affected
//!   by that operation.
//! - **PropertyChanges**: old and new value of every property changed by
//!   a log entry.
//! - **Variables**: key/value store for process-level state; the
//!   `LastTransaction` entry points at the last applied transaction and
//!   wanders up and down the log as the user hits undo/redo.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, error};

use crate::error::{StorageError, StorageResult};
use crate::geometry::BoundingBox;
use crate::objects::{ObjectId, ObjectTypeId, StoredObject, Ucs};
use crate::storage::command::DbCommand;
use crate::storage::connection::{DbConnection, StorageConfig};
use crate::storage::entity_handler::EntityHandler;
use crate::storage::object_handler::ObjectHandler;
use crate::storage::registry;
use crate::storage::transaction_log::{
    PropertyChange, PropertyDataType, PropertyValue, Transaction, TransactionId,
};
use crate::storage::ucs_handler::UcsHandler;

/// Key of the `Variables` row holding the last applied transaction id.
const LAST_TRANSACTION_KEY: &str = "LastTransaction";

/// Persistent, transactional storage for one document.
///
/// The connection is owned exclusively by this instance for its lifetime
/// and is closed when the instance is dropped. The facade is not safe for
/// concurrent callers without external synchronisation.
#[derive(Debug)]
pub struct DocumentStorage {
    db: DbConnection,
}

impl DocumentStorage {
    /// Open (or create) the document database at `file_name` with default
    /// configuration. Pass `":memory:"` to keep the database in memory.
    ///
    /// All object types must be registered before the first storage
    /// instance opens a database; their tables are created here.
    pub fn open(file_name: &str) -> StorageResult<Self> {
        Self::open_with_config(file_name, &StorageConfig::default())
    }

    /// Open (or create) the document database with explicit connection
    /// tuning.
    pub fn open_with_config(file_name: &str, config: &StorageConfig) -> StorageResult<Self> {
        let db = DbConnection::open(file_name, config)?;

        db.execute_non_query(
            "CREATE TABLE IF NOT EXISTS Transaction2(\
                id INTEGER PRIMARY KEY, \
                parentId INTEGER, \
                text VARCHAR\
            );",
        )
        .map_err(|e| StorageError::Schema(e.to_string()))?;

        db.execute_non_query(
            "CREATE TABLE IF NOT EXISTS AffectedObjects(\
                tid INTEGER, \
                oid INTEGER, \
                PRIMARY KEY(tid, oid)\
            );",
        )
        .map_err(|e| StorageError::Schema(e.to_string()))?;

        db.execute_non_query(
            "CREATE TABLE IF NOT EXISTS PropertyChanges(\
                tid INTEGER, \
                oid INTEGER, \
                pid INTEGER, \
                dataType INTEGER, \
                oldValue BLOB, \
                newValue BLOB, \
                PRIMARY KEY(tid, oid, pid)\
            );",
        )
        .map_err(|e| StorageError::Schema(e.to_string()))?;

        db.execute_non_query(
            "CREATE TABLE IF NOT EXISTS Variables(\
                key STRING PRIMARY KEY, \
                value BLOB\
            );",
        )
        .map_err(|e| StorageError::Schema(e.to_string()))?;

        {
            let mut cmd = DbCommand::new(&db, "INSERT OR IGNORE INTO Variables VALUES(?,?)")?;
            cmd.bind_text(1, LAST_TRANSACTION_KEY)?;
            cmd.bind_i64(2, -1)?;
            cmd.execute_non_query()?;
        }

        // fan out the per-type DDL for all registered object types
        registry::init_db(&db).map_err(|e| match e {
            StorageError::Sql(e) => StorageError::Schema(e.to_string()),
            other => other,
        })?;

        Ok(Self { db })
    }

    /// Close the storage, reporting any pending driver error. Dropping
    /// the storage closes the connection as well.
    pub fn close(self) -> StorageResult<()> {
        self.db.close()
    }

    // ----- object queries ------------------------------------------------

    /// Ids of all live objects.
    pub fn query_all_objects(&self) -> StorageResult<BTreeSet<ObjectId>> {
        ObjectHandler::query_all_objects(&self.db)
    }

    /// Ids of all live drawing entities.
    pub fn query_all_entities(&self) -> StorageResult<BTreeSet<ObjectId>> {
        EntityHandler::query_all_entities(&self.db)
    }

    /// Ids of all live coordinate systems.
    pub fn query_all_ucs(&self) -> StorageResult<BTreeSet<ObjectId>> {
        UcsHandler::query_all_ucs(&self.db)
    }

    /// Ids of all live entities that are currently selected.
    pub fn query_selected_entities(&self) -> StorageResult<BTreeSet<ObjectId>> {
        EntityHandler::query_selected_entities(&self.db)
    }

    /// Load the live object with the given id. Absent or hidden ids, and
    /// ids whose type has no registered handler, yield `None`.
    pub fn query_object(&self, object_id: ObjectId) -> StorageResult<Option<StoredObject>> {
        let Some(object_type_id) = self.object_type_id(object_id)? else {
            return Ok(None);
        };

        let Some(handler) = registry::handler_for(object_type_id) else {
            error!(
                object_id,
                object_type_id, "no handler registered for object type"
            );
            return Ok(None);
        };

        handler.load_object(&self.db, object_id).map(Some)
    }

    /// Load the live entity with the given id; `None` if the id does not
    /// name a drawing entity.
    pub fn query_entity(&self, entity_id: ObjectId) -> StorageResult<Option<StoredObject>> {
        Ok(self.query_object(entity_id)?.filter(StoredObject::is_entity))
    }

    /// Load the live coordinate system with the given id; `None` if the
    /// id does not name a coordinate system.
    pub fn query_ucs(&self, ucs_id: ObjectId) -> StorageResult<Option<Ucs>> {
        Ok(self.query_object(ucs_id)?.and_then(StoredObject::into_ucs))
    }

    // ----- object mutation -----------------------------------------------

    /// Save the object: insert when its id is `-1` (the assigned id is
    /// written back), update otherwise.
    pub fn save_object(&self, object: &mut StoredObject) -> StorageResult<()> {
        let is_new = object.id() == -1;
        let object_type_id = object.object_type_id();

        let handler = registry::handler_for(object_type_id)
            .ok_or(StorageError::UnknownObjectType(object_type_id))?;

        handler.save_object(&self.db, object, is_new)
    }

    /// Delete the object's rows in all tables of its type chain. Objects
    /// hidden by undo are deleted as well; an id with no registered
    /// handler is logged and skipped.
    pub fn delete_object(&self, object_id: ObjectId) -> StorageResult<()> {
        let Some(object_type_id) = self.stored_object_type_id(object_id)? else {
            error!(object_id, "cannot delete: object not found");
            return Ok(());
        };

        let Some(handler) = registry::handler_for(object_type_id) else {
            error!(
                object_id,
                object_type_id, "no handler registered for object type"
            );
            return Ok(());
        };

        handler.delete_object(&self.db, object_id)
    }

    // ----- driver transactions -------------------------------------------

    /// Begin a unit of work spanning several facade calls.
    pub fn begin_transaction(&self) -> StorageResult<()> {
        self.db.start_transaction()
    }

    /// Commit the unit of work started by
    /// [`begin_transaction`](DocumentStorage::begin_transaction).
    pub fn commit_transaction(&self) -> StorageResult<()> {
        self.db.end_transaction()
    }

    // ----- transaction log -----------------------------------------------

    /// Id of the last applied transaction, `-1` when the log has never
    /// been written.
    pub fn last_transaction_id(&self) -> StorageResult<TransactionId> {
        let mut cmd = DbCommand::new(&self.db, "SELECT value FROM Variables WHERE key=?")?;
        cmd.bind_text(1, LAST_TRANSACTION_KEY)?;
        cmd.execute_int()
    }

    /// Move the last-transaction pointer; the application's undo/redo
    /// machinery steps it down (undo) and up (redo).
    pub fn set_last_transaction_id(&self, transaction_id: TransactionId) -> StorageResult<()> {
        let mut cmd = DbCommand::new(&self.db, "UPDATE Variables SET value=? WHERE key=?")?;
        cmd.bind_i64(1, transaction_id)?;
        cmd.bind_text(2, LAST_TRANSACTION_KEY)?;
        cmd.execute_non_query()?;
        Ok(())
    }

    /// Largest transaction id in the log, `-1` when the log is empty.
    pub fn max_transaction_id(&self) -> StorageResult<TransactionId> {
        let mut cmd = DbCommand::new(&self.db, "SELECT max(id) FROM Transaction2")?;
        let mut reader = cmd.query();
        match reader.step()? {
            Some(row) => Ok(row.get_opt_i64(0)?.unwrap_or(-1)),
            None => Ok(-1),
        }
    }

    /// Append a transaction to the log.
    ///
    /// Non-undoable transactions are not persisted at all. Otherwise the
    /// transaction gets the id after the current last transaction, any
    /// diverged future (transactions at or above that id) is pruned, the
    /// log rows are written, and the last-transaction pointer advances.
    pub fn save_transaction(&self, transaction: &mut Transaction) -> StorageResult<()> {
        if !transaction.is_undoable() {
            return Ok(());
        }

        transaction.set_id(self.last_transaction_id()? + 1);

        // transactions above the save point are lost for good
        self.delete_transactions_from(transaction.id())?;

        let mut cmd = DbCommand::new(&self.db, "INSERT INTO Transaction2 VALUES(?,?,?)")?;
        cmd.bind_i64(1, transaction.id())?;
        cmd.bind_null(2)?;
        cmd.bind_text(3, transaction.text())?;
        cmd.execute_non_query()?;

        for &object_id in transaction.affected_objects() {
            debug!(
                tid = transaction.id(),
                oid = object_id,
                "recording affected object"
            );
            let mut cmd = DbCommand::new(&self.db, "INSERT INTO AffectedObjects VALUES(?,?)")?;
            cmd.bind_i64(1, transaction.id())?;
            cmd.bind_i64(2, object_id)?;
            cmd.execute_non_query()?;
        }

        for (&object_id, changes) in transaction.property_changes() {
            for change in changes {
                let mut cmd =
                    DbCommand::new(&self.db, "INSERT INTO PropertyChanges VALUES(?,?,?,?,?,?)")?;
                cmd.bind_i64(1, transaction.id())?;
                cmd.bind_i64(2, object_id)?;
                cmd.bind_i64(3, change.property_type_id)?;
                cmd.bind_i64(4, change.old_value.data_type().tag())?;
                change.old_value.bind(&mut cmd, 5)?;
                change.new_value.bind(&mut cmd, 6)?;
                cmd.execute_non_query()?;
            }
        }

        self.set_last_transaction_id(transaction.id())
    }

    /// Reconstruct the transaction with the given id from the log. A
    /// pruned or never-saved id yields an empty transaction: the label
    /// lookup is the one place a driver error is recovered locally, by
    /// substituting the empty string.
    pub fn get_transaction(&self, transaction_id: TransactionId) -> StorageResult<Transaction> {
        let text = {
            let mut cmd = DbCommand::new(&self.db, "SELECT text FROM Transaction2 WHERE id=?")?;
            cmd.bind_i64(1, transaction_id)?;
            cmd.execute_string().unwrap_or_default()
        };

        let mut affected_objects = BTreeSet::new();
        {
            let mut cmd = DbCommand::new(&self.db, "SELECT oid FROM AffectedObjects WHERE tid=?")?;
            cmd.bind_i64(1, transaction_id)?;
            let mut reader = cmd.query();
            while let Some(row) = reader.step()? {
                affected_objects.insert(row.get_i64(0)?);
            }
        }

        let mut property_changes: BTreeMap<ObjectId, Vec<PropertyChange>> = BTreeMap::new();
        {
            let mut cmd = DbCommand::new(
                &self.db,
                "SELECT oid, pid, dataType, oldValue, newValue FROM PropertyChanges WHERE tid=?",
            )?;
            cmd.bind_i64(1, transaction_id)?;
            let mut reader = cmd.query();
            while let Some(row) = reader.step()? {
                let object_id = row.get_i64(0)?;
                let property_type_id = row.get_i64(1)?;
                let tag = row.get_i64(2)?;

                let Some(data_type) = PropertyDataType::from_tag(tag) else {
                    error!(tid = transaction_id, oid = object_id, tag, "unknown property value type");
                    continue;
                };

                let change = PropertyChange::new(
                    property_type_id,
                    PropertyValue::read(&row, 3, data_type)?,
                    PropertyValue::read(&row, 4, data_type)?,
                );
                property_changes.entry(object_id).or_default().push(change);
            }
        }

        Ok(Transaction::from_parts(
            transaction_id,
            text,
            affected_objects,
            property_changes,
        ))
    }

    /// Prune the log from `transaction_id` upwards.
    ///
    /// Objects whose entire existence lies inside the cut region (no
    /// surviving transaction references them) are physically removed,
    /// then the affected-object rows, property changes and transaction
    /// rows of the cut region are deleted.
    pub fn delete_transactions_from(&self, transaction_id: TransactionId) -> StorageResult<()> {
        debug!(transaction_id, "pruning transaction log");

        let cut_objects = {
            let mut cmd =
                DbCommand::new(&self.db, "SELECT oid FROM AffectedObjects WHERE tid>=?")?;
            cmd.bind_i64(1, transaction_id)?;
            let mut reader = cmd.query();
            let mut ids = BTreeSet::new();
            while let Some(row) = reader.step()? {
                ids.insert(row.get_i64(0)?);
            }
            ids
        };

        for object_id in cut_objects {
            // keep the object if a surviving transaction still refers to it
            let mut cmd = DbCommand::new(
                &self.db,
                "SELECT oid FROM AffectedObjects WHERE tid<? AND oid=?",
            )?;
            cmd.bind_i64(1, transaction_id)?;
            cmd.bind_i64(2, object_id)?;
            let mut reader = cmd.query();
            if reader.step()?.is_none() {
                debug!(object_id, "removing orphaned object");
                self.delete_object(object_id)?;
            }
        }

        let mut cmd = DbCommand::new(&self.db, "DELETE FROM AffectedObjects WHERE tid>=?")?;
        cmd.bind_i64(1, transaction_id)?;
        cmd.execute_non_query()?;

        let mut cmd = DbCommand::new(&self.db, "DELETE FROM PropertyChanges WHERE tid>=?")?;
        cmd.bind_i64(1, transaction_id)?;
        cmd.execute_non_query()?;

        let mut cmd = DbCommand::new(&self.db, "DELETE FROM Transaction2 WHERE id>=?")?;
        cmd.bind_i64(1, transaction_id)?;
        cmd.execute_non_query()?;

        Ok(())
    }

    // ----- undo status ---------------------------------------------------

    /// Flip the undo bit of one object. Undo hides the object from live
    /// queries; a second toggle brings it back.
    pub fn toggle_undo_status(&self, object_id: ObjectId) -> StorageResult<()> {
        let mut cmd = DbCommand::new(
            &self.db,
            "UPDATE Object SET undoStatus=NOT(undoStatus) WHERE id=?",
        )?;
        cmd.bind_i64(1, object_id)?;
        cmd.execute_non_query()?;
        Ok(())
    }

    /// Flip the undo bit of every object in the set.
    pub fn toggle_undo_status_all(&self, object_ids: &BTreeSet<ObjectId>) -> StorageResult<()> {
        for &object_id in object_ids {
            debug!(object_id, "toggling undo status");
            self.toggle_undo_status(object_id)?;
        }
        Ok(())
    }

    /// The undo bit of one object.
    pub fn undo_status(&self, object_id: ObjectId) -> StorageResult<bool> {
        let mut cmd = DbCommand::new(&self.db, "SELECT undoStatus FROM Object WHERE id=?")?;
        cmd.bind_i64(1, object_id)?;
        Ok(cmd.execute_int()? != 0)
    }

    // ----- selection -----------------------------------------------------

    /// Deselect all entities. Ids whose state changes are added to
    /// `affected`.
    pub fn clear_entity_selection(
        &self,
        affected: Option<&mut BTreeSet<ObjectId>>,
    ) -> StorageResult<()> {
        EntityHandler::clear_entity_selection(&self.db, affected)
    }

    /// Select one entity, additively or exclusively. See
    /// [`EntityHandler::select_entity`].
    pub fn select_entity(
        &self,
        entity_id: ObjectId,
        add: bool,
        affected: Option<&mut BTreeSet<ObjectId>>,
    ) -> StorageResult<()> {
        EntityHandler::select_entity(&self.db, entity_id, add, affected)
    }

    /// Select a set of entities, additively or exclusively. See
    /// [`EntityHandler::select_entities`].
    pub fn select_entities(
        &self,
        entity_ids: &BTreeSet<ObjectId>,
        add: bool,
        affected: Option<&mut BTreeSet<ObjectId>>,
    ) -> StorageResult<()> {
        EntityHandler::select_entities(&self.db, entity_ids, add, affected)
    }

    /// Bounding box of all live entities; degenerate at the origin for an
    /// empty document.
    pub fn bounding_box(&self) -> StorageResult<BoundingBox> {
        EntityHandler::bounding_box(&self.db)
    }

    // ----- variables -----------------------------------------------------

    /// Read an integer entry of the `Variables` table.
    pub fn variable_int(&self, key: &str) -> StorageResult<Option<i64>> {
        let mut cmd = DbCommand::new(&self.db, "SELECT value FROM Variables WHERE key=?")?;
        cmd.bind_text(1, key)?;
        let mut reader = cmd.query();
        match reader.step()? {
            Some(row) => Ok(Some(row.get_i64(0)?)),
            None => Ok(None),
        }
    }

    /// Write an integer entry of the `Variables` table, creating it if
    /// necessary.
    pub fn set_variable_int(&self, key: &str, value: i64) -> StorageResult<()> {
        let mut cmd = DbCommand::new(&self.db, "INSERT OR REPLACE INTO Variables VALUES(?,?)")?;
        cmd.bind_text(1, key)?;
        cmd.bind_i64(2, value)?;
        cmd.execute_non_query()?;
        Ok(())
    }

    // ----- internal ------------------------------------------------------

    /// Type id of a live object, `None` for absent or hidden ids.
    fn object_type_id(&self, object_id: ObjectId) -> StorageResult<Option<ObjectTypeId>> {
        let mut cmd = DbCommand::new(
            &self.db,
            "SELECT objectTypeId FROM Object WHERE id=? AND undoStatus=0",
        )?;
        cmd.bind_i64(1, object_id)?;
        let mut reader = cmd.query();
        match reader.step()? {
            Some(row) => Ok(Some(row.get_i64(0)?)),
            None => Ok(None),
        }
    }

    /// Type id of an object regardless of its undo status. The delete
    /// path uses this so that pruning can remove objects hidden by undo.
    fn stored_object_type_id(&self, object_id: ObjectId) -> StorageResult<Option<ObjectTypeId>> {
        let mut cmd = DbCommand::new(&self.db, "SELECT objectTypeId FROM Object WHERE id=?")?;
        cmd.bind_i64(1, object_id)?;
        let mut reader = cmd.query();
        match reader.step()? {
            Some(row) => Ok(Some(row.get_i64(0)?)),
            None => Ok(None),
        }
    }
}
