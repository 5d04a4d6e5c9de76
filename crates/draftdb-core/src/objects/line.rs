//! Line entities

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Vector3};
use crate::objects::ObjectId;

/// A straight line segment between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    id: ObjectId,
    selected: bool,
    pub start_point: Vector3,
    pub end_point: Vector3,
}

impl Line {
    /// Create an unsaved line from its end points.
    pub fn new(start_point: Vector3, end_point: Vector3) -> Self {
        Self {
            id: -1,
            selected: false,
            start_point,
            end_point,
        }
    }

    /// The persistent id, or `-1` before the first save.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    /// Whether this line is part of the current selection.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Axis-aligned bounding box of the segment.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_corners(self.start_point, self.end_point)
    }
}

impl Default for Line {
    fn default() -> Self {
        Self::new(Vector3::ZERO, Vector3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_is_corner_normalized() {
        let line = Line::new(Vector3::new(5.0, 0.0, 1.0), Vector3::new(-1.0, 2.0, 0.0));
        let bbox = line.bounding_box();
        assert_eq!(bbox.min, Vector3::new(-1.0, 0.0, 0.0));
        assert_eq!(bbox.max, Vector3::new(5.0, 2.0, 1.0));
    }
}
