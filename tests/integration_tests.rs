//! End-to-end editing sessions over file-backed documents
//!
//! These tests drive the storage the way the application's undo/redo
//! machinery does: every user operation is one logged transaction, undo
//! toggles the undo bit of the affected objects and steps the
//! last-transaction pointer down, redo steps it back up, and committing
//! new work over undone steps prunes the diverged future.

use anyhow::Result;
use draftdb_core::{
    BoundingBox, PropertyChange, PropertyValue, Transaction, Vector3,
};
use tempfile::TempDir;

mod test_data;
use test_data::{open_document, rectangle_corners, save_line, save_line_logged};

#[test]
fn test_full_editing_session_with_undo_redo() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("session.db");
    let path = path.to_str().expect("utf-8 temp path");

    let storage = open_document(path)?;

    // draw a rectangle outline, one transaction per segment
    let mut line_ids = Vec::new();
    for (i, (start, end)) in rectangle_corners().into_iter().enumerate() {
        let (line_id, tx_id) = save_line_logged(&storage, start, end, &format!("segment {i}"))?;
        line_ids.push(line_id);
        assert_eq!(tx_id, i as i64);
    }
    assert_eq!(storage.query_all_entities()?.len(), 4);
    assert_eq!(storage.last_transaction_id()?, 3);
    assert_eq!(storage.max_transaction_id()?, 3);

    // undo the last two segments
    for tx_id in [3, 2] {
        let tx = storage.get_transaction(tx_id)?;
        storage.toggle_undo_status_all(tx.affected_objects())?;
        storage.set_last_transaction_id(tx_id - 1)?;
    }
    assert_eq!(storage.query_all_entities()?.len(), 2);
    assert!(storage.query_object(line_ids[3])?.is_none());

    // redo one of them
    let tx = storage.get_transaction(2)?;
    storage.toggle_undo_status_all(tx.affected_objects())?;
    storage.set_last_transaction_id(2)?;
    assert_eq!(storage.query_all_entities()?.len(), 3);
    assert!(storage.query_object(line_ids[2])?.is_some());

    // committing new work invalidates the remaining redo step and
    // garbage-collects the segment that only existed inside it
    let (diagonal_id, tx_id) = save_line_logged(
        &storage,
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(10.0, 5.0, 0.0),
        "diagonal",
    )?;
    assert_eq!(tx_id, 3);
    assert_eq!(storage.max_transaction_id()?, 3);
    assert!(storage.query_object(line_ids[3])?.is_none());
    assert_eq!(storage.get_transaction(3)?.text(), "diagonal");

    // the pruned slot reads back empty through the local label recovery
    assert!(storage.get_transaction(4)?.text().is_empty());

    storage.close()?;

    // everything survives a reopen
    let storage = open_document(path)?;
    assert_eq!(storage.last_transaction_id()?, 3);
    assert_eq!(storage.max_transaction_id()?, 3);
    assert_eq!(storage.query_all_entities()?.len(), 4);
    assert!(storage.query_object(diagonal_id)?.is_some());
    Ok(())
}

#[test]
fn test_property_changes_follow_the_log() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("properties.db");
    let storage = open_document(path.to_str().expect("utf-8 temp path"))?;

    let line_id = save_line(
        &storage,
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
    )?;

    let mut tx = Transaction::new("change end point");
    tx.add_property_change(
        line_id,
        PropertyChange::new(
            1,
            PropertyValue::Double(1.0),
            PropertyValue::Double(8.0),
        ),
    );
    tx.add_property_change(
        line_id,
        PropertyChange::new(
            2,
            PropertyValue::String("continuous".into()),
            PropertyValue::String("dashed".into()),
        ),
    );
    storage.save_transaction(&mut tx)?;

    let loaded = storage.get_transaction(tx.id())?;
    let changes = &loaded.property_changes()[&line_id];
    assert_eq!(changes.len(), 2);
    assert_eq!(
        changes[0].old_value,
        PropertyValue::Double(1.0)
    );
    assert_eq!(changes[1].new_value, PropertyValue::String("dashed".into()));
    Ok(())
}

#[test]
fn test_bounding_box_tracks_live_geometry() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("bounds.db");
    let storage = open_document(path.to_str().expect("utf-8 temp path"))?;

    let (first, _) = save_line_logged(
        &storage,
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(10.0, 0.0, 0.0),
        "first",
    )?;
    save_line_logged(
        &storage,
        Vector3::new(-4.0, 2.0, 0.0),
        Vector3::new(1.0, 6.0, 1.0),
        "second",
    )?;

    assert_eq!(
        storage.bounding_box()?,
        BoundingBox::from_corners(Vector3::new(-4.0, 0.0, 0.0), Vector3::new(10.0, 6.0, 1.0))
    );

    // undoing the first segment shrinks the box to the survivor
    let tx = storage.get_transaction(0)?;
    storage.toggle_undo_status_all(tx.affected_objects())?;
    assert!(!storage.query_all_entities()?.contains(&first));
    assert_eq!(
        storage.bounding_box()?,
        BoundingBox::from_corners(Vector3::new(-4.0, 2.0, 0.0), Vector3::new(1.0, 6.0, 1.0))
    );
    Ok(())
}
