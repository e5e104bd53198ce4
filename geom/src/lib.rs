pub mod aabb;
pub mod distance;
pub mod mat3;
pub mod pt2;
pub mod pt3;
pub mod sample;
pub mod vec3;

pub use aabb::Aabb;
pub use distance::Distance;
pub use mat3::Mat3;
pub use pt2::Point2;
pub use pt3::Point3;
pub use vec3::Vec3;

use serde::{Deserialize, Serialize};

/// An enum over the X, Y and Z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Return the axis with the given index where X is 0, Y is 1 and Z is 2.
    /// Panics on anything else.
    pub fn from_index(i: usize) -> Self {
        match i {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => panic!("no axis with index {}", i),
        }
    }

    /// Return the index of the axis, X being 0, Y being 1 and Z being 2.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}
