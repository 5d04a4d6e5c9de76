//! Registry lifecycle scenarios
//!
//! These run as their own test binary so that tearing the process-scoped
//! registry down cannot interfere with other test suites.

use anyhow::Result;
use draftdb_core::storage::registry;
use draftdb_core::{Vector3, OBJECT_TYPE_LINE, OBJECT_TYPE_UCS};

mod test_data;
use test_data::{open_document, save_line};

#[test]
fn test_registry_lifecycle() -> Result<()> {
    // startup: populate, then open storages against the registered types
    registry::register_standard_object_types();
    assert!(registry::handler_for(OBJECT_TYPE_UCS).is_some());
    assert!(registry::handler_for(OBJECT_TYPE_LINE).is_some());
    assert!(registry::handler_for(42).is_none());

    // registering the standard types again is a no-op
    registry::register_standard_object_types();

    {
        let storage = open_document(":memory:")?;
        save_line(
            &storage,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        )?;
        assert_eq!(storage.query_all_entities()?.len(), 1);
    }

    // teardown and re-registration
    registry::clean_up();
    assert!(registry::handler_for(OBJECT_TYPE_LINE).is_none());

    registry::register_standard_object_types();
    let storage = open_document(":memory:")?;
    save_line(
        &storage,
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(2.0, 0.0, 0.0),
    )?;
    assert_eq!(storage.query_all_entities()?.len(), 1);
    Ok(())
}
