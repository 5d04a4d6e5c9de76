//! Transaction log value objects
//!
//! A [`Transaction`] describes one user operation: a label, the set of
//! object ids it affected, and per-object property changes carrying the
//! old and new value of each changed property. Transactions are stored in
//! the log by the facade and replayed (in either direction) by the
//! application's undo/redo machinery.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::StorageResult;
use crate::objects::ObjectId;
use crate::storage::command::{DbCommand, DbRow};

/// Identifier of a stored transaction. Ids are dense and monotonic from
/// 0; `-1` marks a transaction that has not been saved yet.
pub type TransactionId = i64;

/// Identifier of a property within an object type.
pub type PropertyTypeId = i64;

/// Discriminator of a property value, as stored in the `dataType` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyDataType {
    Boolean,
    Integer,
    Double,
    String,
}

impl PropertyDataType {
    /// The integer tag stored on disk.
    pub fn tag(self) -> i64 {
        match self {
            Self::Boolean => 0,
            Self::Integer => 1,
            Self::Double => 2,
            Self::String => 3,
        }
    }

    /// Decode the on-disk tag.
    pub fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            0 => Some(Self::Boolean),
            1 => Some(Self::Integer),
            2 => Some(Self::Double),
            3 => Some(Self::String),
            _ => None,
        }
    }
}

/// A property value: a tagged union over the four storable scalar types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl PropertyValue {
    /// The discriminator stored alongside the encoded value.
    pub fn data_type(&self) -> PropertyDataType {
        match self {
            Self::Boolean(_) => PropertyDataType::Boolean,
            Self::Integer(_) => PropertyDataType::Integer,
            Self::Double(_) => PropertyDataType::Double,
            Self::String(_) => PropertyDataType::String,
        }
    }

    /// Bind this value to the 1-based parameter `index`.
    pub(crate) fn bind(&self, cmd: &mut DbCommand<'_>, index: usize) -> StorageResult<()> {
        match self {
            Self::Boolean(v) => cmd.bind_bool(index, *v),
            Self::Integer(v) => cmd.bind_i64(index, *v),
            Self::Double(v) => cmd.bind_f64(index, *v),
            Self::String(v) => cmd.bind_text(index, v),
        }
    }

    /// Read a value of `data_type` from the 0-based `column`.
    pub(crate) fn read(
        row: &DbRow<'_>,
        column: usize,
        data_type: PropertyDataType,
    ) -> StorageResult<Self> {
        Ok(match data_type {
            PropertyDataType::Boolean => Self::Boolean(row.get_bool(column)?),
            PropertyDataType::Integer => Self::Integer(row.get_i64(column)?),
            PropertyDataType::Double => Self::Double(row.get_f64(column)?),
            PropertyDataType::String => Self::String(row.get_string(column)?),
        })
    }
}

/// One property change of one object: old and new value of the property,
/// both of the same data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub property_type_id: PropertyTypeId,
    pub old_value: PropertyValue,
    pub new_value: PropertyValue,
}

impl PropertyChange {
    pub fn new(
        property_type_id: PropertyTypeId,
        old_value: PropertyValue,
        new_value: PropertyValue,
    ) -> Self {
        Self {
            property_type_id,
            old_value,
            new_value,
        }
    }
}

/// A change set: one labelled, replayable user operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    text: String,
    undoable: bool,
    affected_objects: BTreeSet<ObjectId>,
    property_changes: BTreeMap<ObjectId, Vec<PropertyChange>>,
}

impl Transaction {
    /// Create an empty, undoable change set with the given label. The id
    /// is assigned when the transaction is saved.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: -1,
            text: text.into(),
            undoable: true,
            affected_objects: BTreeSet::new(),
            property_changes: BTreeMap::new(),
        }
    }

    pub(crate) fn from_parts(
        id: TransactionId,
        text: String,
        affected_objects: BTreeSet<ObjectId>,
        property_changes: BTreeMap<ObjectId, Vec<PropertyChange>>,
    ) -> Self {
        Self {
            id,
            text,
            undoable: true,
            affected_objects,
            property_changes,
        }
    }

    /// The assigned id, or `-1` before the transaction is saved.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: TransactionId) {
        self.id = id;
    }

    /// The human-readable label.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether saving this transaction persists anything. Non-undoable
    /// transactions skip the log entirely.
    pub fn is_undoable(&self) -> bool {
        self.undoable
    }

    pub fn set_undoable(&mut self, undoable: bool) {
        self.undoable = undoable;
    }

    /// Record that this operation modified `object_id`.
    pub fn add_affected_object(&mut self, object_id: ObjectId) {
        self.affected_objects.insert(object_id);
    }

    /// Record a property change of `object_id`. The object id joins the
    /// affected set; a change whose old and new values disagree on data
    /// type is rejected and logged.
    pub fn add_property_change(&mut self, object_id: ObjectId, change: PropertyChange) {
        if change.old_value.data_type() != change.new_value.data_type() {
            error!(
                object_id,
                property_type_id = change.property_type_id,
                "property change with mismatched value types ignored"
            );
            return;
        }
        self.affected_objects.insert(object_id);
        self.property_changes
            .entry(object_id)
            .or_default()
            .push(change);
    }

    /// Ids of all objects this operation modified.
    pub fn affected_objects(&self) -> &BTreeSet<ObjectId> {
        &self.affected_objects
    }

    /// Property changes, grouped by object id.
    pub fn property_changes(&self) -> &BTreeMap<ObjectId, Vec<PropertyChange>> {
        &self.property_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_tags_round_trip() {
        for dt in [
            PropertyDataType::Boolean,
            PropertyDataType::Integer,
            PropertyDataType::Double,
            PropertyDataType::String,
        ] {
            assert_eq!(PropertyDataType::from_tag(dt.tag()), Some(dt));
        }
        assert_eq!(PropertyDataType::from_tag(4), None);
    }

    #[test]
    fn test_property_change_implies_affected() {
        let mut tx = Transaction::new("move line");
        tx.add_property_change(
            7,
            PropertyChange::new(1, PropertyValue::Double(0.0), PropertyValue::Double(2.5)),
        );
        assert!(tx.affected_objects().contains(&7));
        assert_eq!(tx.property_changes()[&7].len(), 1);
    }

    #[test]
    fn test_mismatched_change_is_rejected() {
        let mut tx = Transaction::new("broken");
        tx.add_property_change(
            3,
            PropertyChange::new(1, PropertyValue::Integer(1), PropertyValue::String("x".into())),
        );
        assert!(tx.property_changes().is_empty());
        assert!(tx.affected_objects().is_empty());
    }

    #[test]
    fn test_new_transaction_is_unsaved_and_undoable() {
        let tx = Transaction::new("op");
        assert_eq!(tx.id(), -1);
        assert!(tx.is_undoable());
        assert!(tx.affected_objects().is_empty());
    }
}
