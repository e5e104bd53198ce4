use serde::{Deserialize, Serialize};

use crate::{Axis, Point3, Vec3};

/// An [Axis aligned bounding box][0] useful for approximating the boundary of
/// shapes.
///
/// [0]:
/// https://en.wikipedia.org/wiki/Minimum_bounding_box#Axis-aligned_minimum_bounding_box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    min: Point3,
    max: Point3,
}

impl Aabb {
    /// Create a bounding box that covers a single point.
    pub fn new(p: Point3) -> Self {
        Aabb { min: p, max: p }
    }

    /// Build a bounding box that covers all the points in the given iterator.
    /// Returns `None` if there are no points to cover.
    pub fn from_points(it: impl IntoIterator<Item = Point3>) -> Option<Self> {
        let mut it = it.into_iter();

        let p0 = it.next()?;
        let mut aabb = Aabb::new(p0);

        for p in it {
            aabb.expand(&p);
        }

        Some(aabb)
    }

    /// Return the lowest point of the bounding box.
    pub fn min(&self) -> &Point3 {
        &self.min
    }

    /// Return the highest point of the bounding box.
    pub fn max(&self) -> &Point3 {
        &self.max
    }

    /// Return the center of the bounding box.
    pub fn center(&self) -> Point3 {
        Point3::lerp(self.min, self.max, 0.5)
    }

    /// Return the dimensions of the bounding box.
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Return the total area of the six faces of the bounding box.
    pub fn surface_area(&self) -> f64 {
        let d = self.dimensions();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Return the axis the bounding box extends the most along.
    pub fn longest_axis(&self) -> Axis {
        let d = self.dimensions();

        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Expand the bounding box so that it covers the given point too.
    pub fn expand(&mut self, p: &Point3) {
        if p.x < self.min.x {
            self.min.x = p.x;
        }
        if p.x > self.max.x {
            self.max.x = p.x;
        }

        if p.y < self.min.y {
            self.min.y = p.y;
        }
        if p.y > self.max.y {
            self.max.y = p.y;
        }

        if p.z < self.min.z {
            self.min.z = p.z;
        }
        if p.z > self.max.z {
            self.max.z = p.z;
        }
    }

    /// Expand the bounding box so that it covers the given point too,
    /// returning it for chaining.
    pub fn expanded(mut self, p: &Point3) -> Self {
        self.expand(p);
        self
    }

    /// Return the smallest bounding box covering both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut aabb = self.clone();
        aabb.expand(&other.min);
        aabb.expand(&other.max);
        aabb
    }

    /// Check if the bounding box contains the given point.
    pub fn contains(&self, p: &Point3) -> bool {
        self.min.x <= p.x
            && self.max.x >= p.x
            && self.min.y <= p.y
            && self.max.y >= p.y
            && self.min.z <= p.z
            && self.max.z >= p.z
    }

    /// Check whether two bounding boxes overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Check whether a ray hits the bounding box within `[t_min, t_max]`
    /// using the [slab method][0] on all three axes.
    ///
    /// [0]: https://en.wikipedia.org/wiki/Slab_method
    pub fn hit(&self, origin: Point3, dir: Vec3, t_min: f64, t_max: f64) -> bool {
        let mut t_min = t_min;
        let mut t_max = t_max;

        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let inv = 1.0 / dir[axis];

            let mut t0 = (self.min[axis] - origin[axis]) * inv;
            let mut t1 = (self.max[axis] - origin[axis]) * inv;

            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }

            // max/min also discard NaN coming from 0/0 slabs
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);

            if t_max < t_min {
                return false;
            }
        }

        true
    }
}
