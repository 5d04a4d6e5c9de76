//! # DraftDB Core
//!
//! Persistent, transactional storage for CAD documents backed by SQLite.
//!
//! Documents hold a heterogeneous collection of objects: drawing entities
//! such as lines, coordinate systems, and application-registered
//! extensions. Each object type brings its own storage handler; a
//! process-scoped registry dispatches generic save/load/delete calls to
//! the right handler chain. Every user operation can be recorded in a
//! persisted transaction log that supports undo/redo traversal and prunes
//! diverged history when the user commits new work over undone steps.

pub mod error;
pub mod geometry;
pub mod objects;
pub mod storage;

pub use error::{StorageError, StorageResult};
pub use geometry::{BoundingBox, Vector3};
pub use objects::{
    Line, ObjectId, ObjectTypeId, StoredObject, Ucs, FIRST_ENTITY_TYPE_ID, OBJECT_TYPE_LINE,
    OBJECT_TYPE_UCS,
};
pub use storage::{
    DocumentStorage, PropertyChange, PropertyDataType, PropertyTypeId, PropertyValue,
    StorageConfig, Transaction, TransactionId,
};
