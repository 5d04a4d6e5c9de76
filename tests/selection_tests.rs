//! Selection workflow scenarios
//!
//! Models the interaction patterns of a drawing editor: single clicks
//! (exclusive), shift-clicks (additive), marquee selections over id sets,
//! and deselect-all, checking both the resulting selection and the
//! changed-id reporting the renderer relies on.

use std::collections::BTreeSet;

use anyhow::Result;
use draftdb_core::{ObjectId, Vector3};

mod test_data;
use test_data::{open_document, save_line};

fn ids(values: &[ObjectId]) -> BTreeSet<ObjectId> {
    values.iter().copied().collect()
}

#[test]
fn test_click_interaction_sequence() -> Result<()> {
    let storage = open_document(":memory:")?;
    for _ in 0..6 {
        save_line(
            &storage,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        )?;
    }

    // click entity 1: exclusive selection of a single entity
    let mut affected = BTreeSet::new();
    storage.select_entity(1, false, Some(&mut affected))?;
    assert_eq!(storage.query_selected_entities()?, ids(&[1]));
    assert_eq!(affected, ids(&[1]));

    // shift-click entities 3 and 5: additive
    let mut affected = BTreeSet::new();
    storage.select_entity(3, true, Some(&mut affected))?;
    storage.select_entity(5, true, Some(&mut affected))?;
    assert_eq!(storage.query_selected_entities()?, ids(&[1, 3, 5]));
    assert_eq!(affected, ids(&[3, 5]));

    // click entity 3: back to a single selection; 3 stays selected so
    // only the dropped entities changed
    let mut affected = BTreeSet::new();
    storage.select_entity(3, false, Some(&mut affected))?;
    assert_eq!(storage.query_selected_entities()?, ids(&[3]));
    assert_eq!(affected, ids(&[1, 5]));
    Ok(())
}

#[test]
fn test_marquee_selection_replaces_clicks() -> Result<()> {
    let storage = open_document(":memory:")?;
    for _ in 0..6 {
        save_line(
            &storage,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        )?;
    }

    storage.select_entities(&ids(&[2, 4, 6]), true, None)?;

    // marquee over 1..=4 without shift: exact replacement
    let mut affected = BTreeSet::new();
    storage.select_entities(&ids(&[1, 2, 3, 4]), false, Some(&mut affected))?;
    assert_eq!(storage.query_selected_entities()?, ids(&[1, 2, 3, 4]));
    assert_eq!(affected, ids(&[1, 3, 6]));

    // marquee with shift: union
    let mut affected = BTreeSet::new();
    storage.select_entities(&ids(&[5, 6]), true, Some(&mut affected))?;
    assert_eq!(storage.query_selected_entities()?, ids(&[1, 2, 3, 4, 5, 6]));
    assert_eq!(affected, ids(&[5, 6]));
    Ok(())
}

#[test]
fn test_deselect_all_reports_previous_selection() -> Result<()> {
    let storage = open_document(":memory:")?;
    for _ in 0..4 {
        save_line(
            &storage,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        )?;
    }
    storage.select_entities(&ids(&[1, 4]), true, None)?;

    let mut affected = BTreeSet::new();
    storage.clear_entity_selection(Some(&mut affected))?;
    assert!(storage.query_selected_entities()?.is_empty());
    assert_eq!(affected, ids(&[1, 4]));
    Ok(())
}

#[test]
fn test_selection_of_hidden_entities_is_not_reported_live() -> Result<()> {
    let storage = open_document(":memory:")?;
    let a = save_line(
        &storage,
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
    )?;
    let b = save_line(
        &storage,
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
    )?;

    storage.select_entities(&ids(&[a, b]), true, None)?;
    storage.toggle_undo_status(b)?;

    // the hidden entity keeps its selection bit but drops out of the
    // live query
    assert_eq!(storage.query_selected_entities()?, ids(&[a]));

    storage.toggle_undo_status(b)?;
    assert_eq!(storage.query_selected_entities()?, ids(&[a, b]));
    Ok(())
}
