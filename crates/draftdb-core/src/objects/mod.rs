//! Storable domain objects
//!
//! Every persisted object carries a dense integer id (assigned on first
//! save) and an object-type id that selects its storage handler. Drawing
//! entities additionally carry a selection flag and derive a bounding box
//! from their geometry.
//!
//! Loaded objects are represented by the [`StoredObject`] tagged variant;
//! the typed query functions of the storage facade are projections of it.

pub mod line;
pub mod ucs;

pub use line::Line;
pub use ucs::Ucs;

use crate::geometry::BoundingBox;

/// Identifier of a persisted object. `-1` marks an object that has not
/// been saved yet.
pub type ObjectId = i64;

/// Runtime tag identifying the storage handler of an object type.
pub type ObjectTypeId = i64;

/// First object-type id of the entity range. Type ids below this value
/// are reserved for non-entity object types (coordinate systems, ...),
/// ids at or above it for drawing entities.
pub const FIRST_ENTITY_TYPE_ID: ObjectTypeId = 100;

/// Object-type id of user coordinate systems.
pub const OBJECT_TYPE_UCS: ObjectTypeId = 1;

/// Object-type id of line entities.
pub const OBJECT_TYPE_LINE: ObjectTypeId = 100;

/// A loaded object of any registered type.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredObject {
    /// A line entity.
    Line(Line),
    /// A user coordinate system.
    Ucs(Ucs),
}

impl StoredObject {
    /// The persistent id, or `-1` for objects not yet saved.
    pub fn id(&self) -> ObjectId {
        match self {
            Self::Line(line) => line.id(),
            Self::Ucs(ucs) => ucs.id(),
        }
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        match self {
            Self::Line(line) => line.set_id(id),
            Self::Ucs(ucs) => ucs.set_id(id),
        }
    }

    /// The object-type id that selects this object's storage handler.
    pub fn object_type_id(&self) -> ObjectTypeId {
        match self {
            Self::Line(_) => OBJECT_TYPE_LINE,
            Self::Ucs(_) => OBJECT_TYPE_UCS,
        }
    }

    /// Whether this object is a drawing entity.
    pub fn is_entity(&self) -> bool {
        self.object_type_id() >= FIRST_ENTITY_TYPE_ID
    }

    /// Selection flag of a drawing entity; `None` for non-entities.
    pub fn selection_status(&self) -> Option<bool> {
        match self {
            Self::Line(line) => Some(line.is_selected()),
            Self::Ucs(_) => None,
        }
    }

    pub(crate) fn set_selection_status(&mut self, selected: bool) {
        if let Self::Line(line) = self {
            line.set_selected(selected);
        }
    }

    /// Bounding box of a drawing entity; `None` for non-entities.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Self::Line(line) => Some(line.bounding_box()),
            Self::Ucs(_) => None,
        }
    }

    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Self::Line(line) => Some(line),
            _ => None,
        }
    }

    pub(crate) fn as_line_mut(&mut self) -> Option<&mut Line> {
        match self {
            Self::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_ucs(&self) -> Option<&Ucs> {
        match self {
            Self::Ucs(ucs) => Some(ucs),
            _ => None,
        }
    }

    pub(crate) fn as_ucs_mut(&mut self) -> Option<&mut Ucs> {
        match self {
            Self::Ucs(ucs) => Some(ucs),
            _ => None,
        }
    }

    pub fn into_line(self) -> Option<Line> {
        match self {
            Self::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn into_ucs(self) -> Option<Ucs> {
        match self {
            Self::Ucs(ucs) => Some(ucs),
            _ => None,
        }
    }
}

impl From<Line> for StoredObject {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}

impl From<Ucs> for StoredObject {
    fn from(ucs: Ucs) -> Self {
        Self::Ucs(ucs)
    }
}
