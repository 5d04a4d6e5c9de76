//! Shared helpers for the end-to-end test scenarios
#![allow(dead_code)] // each test binary uses its own subset of helpers

use anyhow::Result;
use draftdb_core::storage::registry;
use draftdb_core::{DocumentStorage, Line, ObjectId, StoredObject, Transaction, Vector3};

/// Open a document database with the standard object types registered.
pub fn open_document(file_name: &str) -> Result<DocumentStorage> {
    registry::register_standard_object_types();
    Ok(DocumentStorage::open(file_name)?)
}

/// Save one line and return its assigned id.
pub fn save_line(storage: &DocumentStorage, start: Vector3, end: Vector3) -> Result<ObjectId> {
    let mut object = StoredObject::from(Line::new(start, end));
    storage.save_object(&mut object)?;
    Ok(object.id())
}

/// Save one line and record it in the transaction log under `label`.
/// Returns the line id and the assigned transaction id.
pub fn save_line_logged(
    storage: &DocumentStorage,
    start: Vector3,
    end: Vector3,
    label: &str,
) -> Result<(ObjectId, i64)> {
    storage.begin_transaction()?;
    let line_id = save_line(storage, start, end)?;
    let mut tx = Transaction::new(label);
    tx.add_affected_object(line_id);
    storage.save_transaction(&mut tx)?;
    storage.commit_transaction()?;
    Ok((line_id, tx.id()))
}

/// The four segments of a 10 by 5 rectangle in the XY plane.
pub fn rectangle_corners() -> [(Vector3, Vector3); 4] {
    let p = [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(10.0, 0.0, 0.0),
        Vector3::new(10.0, 5.0, 0.0),
        Vector3::new(0.0, 5.0, 0.0),
    ];
    [(p[0], p[1]), (p[1], p[2]), (p[2], p[3]), (p[3], p[0])]
}
