//! Geometric value types shared by the storable objects
//!
//! These are plain value objects: a 3D vector and an axis-aligned bounding
//! box. The storage layer persists them column-per-component, so the types
//! carry no behaviour beyond construction and componentwise min/max.

use serde::{Deserialize, Serialize};

/// A point or direction in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// The origin / null vector.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a vector from its three components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Componentwise minimum of two vectors.
    pub fn min(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    /// Componentwise maximum of two vectors.
    pub fn max(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }
}

/// An axis-aligned bounding box.
///
/// The empty/degenerate box collapses to a single point at the origin,
/// which is what the storage layer reports when a document contains no
/// entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vector3,
    pub max: Vector3,
}

impl BoundingBox {
    /// Create a box from two arbitrary corners; the corners are normalized
    /// so that `min` holds the componentwise minimum.
    pub fn from_corners(a: Vector3, b: Vector3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The degenerate box `(0,0,0)-(0,0,0)`.
    pub const fn degenerate() -> Self {
        Self {
            min: Vector3::ZERO,
            max: Vector3::ZERO,
        }
    }

    /// The smallest box containing both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::degenerate()
    }
}
