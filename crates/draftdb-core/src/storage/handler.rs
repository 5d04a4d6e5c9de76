//! Object-type handler capability
//!
//! Every storable object type implements this trait to manage its own
//! table rows. Handlers are stateless apart from their type identity and
//! are shared by all storage instances in the process through the
//! [`registry`](crate::storage::registry).
//!
//! The chain-to-parent semantics of the schema are explicit calls:
//! composite handlers own their parent handler and invoke it
//! parent-before-child for `init_db`, `load_into` and save-insert, and
//! child-before-parent for `delete_object` and save-update.

use crate::error::StorageResult;
use crate::objects::{ObjectId, ObjectTypeId, StoredObject};
use crate::storage::connection::DbConnection;

/// Storage capability of one object type.
pub trait ObjectTypeHandler: Send + Sync {
    /// The type id this handler is registered under.
    fn object_type_id(&self) -> ObjectTypeId;

    /// Create this type's tables idempotently, parent tables first.
    fn init_db(&self, db: &DbConnection) -> StorageResult<()>;

    /// Allocate a fresh object and populate it from the database.
    fn load_object(&self, db: &DbConnection, object_id: ObjectId) -> StorageResult<StoredObject>;

    /// Populate an existing, correctly-typed object. Base fields are
    /// filled by the parent chain before the child adds its own. If the
    /// passed object is not of the expected type, the mismatch is logged
    /// and the object is left untouched.
    fn load_into(
        &self,
        db: &DbConnection,
        object: &mut StoredObject,
        object_id: ObjectId,
    ) -> StorageResult<()>;

    /// Upsert: insert when `is_new` (the base row is created first and
    /// assigns the object's id), otherwise update.
    fn save_object(
        &self,
        db: &DbConnection,
        object: &mut StoredObject,
        is_new: bool,
    ) -> StorageResult<()>;

    /// Delete this type's row, then the parent chain's rows.
    fn delete_object(&self, db: &DbConnection, object_id: ObjectId) -> StorageResult<()>;
}
