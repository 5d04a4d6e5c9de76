//! User coordinate systems

use serde::{Deserialize, Serialize};

use crate::geometry::Vector3;
use crate::objects::ObjectId;

/// A user coordinate system: an origin and two axis directions.
///
/// Coordinate systems are not drawing entities; they have no selection
/// state and no bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ucs {
    id: ObjectId,
    pub origin: Vector3,
    pub x_axis_direction: Vector3,
    pub y_axis_direction: Vector3,
}

impl Ucs {
    /// Create an unsaved coordinate system.
    pub fn new(origin: Vector3, x_axis_direction: Vector3, y_axis_direction: Vector3) -> Self {
        Self {
            id: -1,
            origin,
            x_axis_direction,
            y_axis_direction,
        }
    }

    /// The persistent id, or `-1` before the first save.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.id = id;
    }
}

impl Default for Ucs {
    /// The world coordinate system.
    fn default() -> Self {
        Self::new(
            Vector3::ZERO,
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        )
    }
}
