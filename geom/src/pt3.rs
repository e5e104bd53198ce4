use std::ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::{Axis, Vec3};

/// A position in 3D space.
///
/// `Point3` is kept nominally distinct from `Vec3`: subtracting two points
/// yields a `Vec3` displacement and adding a `Vec3` to a point yields another
/// point. Mixing the two up is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Create a new `Point3` with the given coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    /// The origin.
    pub fn origin() -> Self {
        Point3::new(0.0, 0.0, 0.0)
    }

    /// Calculate the distance between two `Point3`.
    pub fn dist(&self, other: &Point3) -> f64 {
        (*self - *other).norm()
    }

    /// Reinterpret this point as a displacement from the origin.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Linearly interpolate between two points with `t` clamped to [0, 1].
    pub fn lerp(a: Point3, b: Point3, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        a + (b - a) * t
    }

    /// Clamp every coordinate of this point into `[min, max]` taken
    /// component-wise.
    pub fn clip(&self, min: Point3, max: Point3) -> Point3 {
        Point3::new(
            self.x.clamp(min.x, max.x),
            self.y.clamp(min.y, max.y),
            self.z.clamp(min.z, max.z),
        )
    }

    /// Check that all the coordinates are neither NaN nor infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Sub for Point3 {
    type Output = Vec3;

    fn sub(self, p: Point3) -> Self::Output {
        Vec3::new(self.x - p.x, self.y - p.y, self.z - p.z)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Point3;

    fn add(self, v: Vec3) -> Self::Output {
        Point3::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl AddAssign<Vec3> for Point3 {
    fn add_assign(&mut self, v: Vec3) {
        self.x += v.x;
        self.y += v.y;
        self.z += v.z;
    }
}

impl Sub<Vec3> for Point3 {
    type Output = Point3;

    fn sub(self, v: Vec3) -> Self::Output {
        Point3::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl SubAssign<Vec3> for Point3 {
    fn sub_assign(&mut self, v: Vec3) {
        self.x -= v.x;
        self.y -= v.y;
        self.z -= v.z;
    }
}

impl Index<Axis> for Point3 {
    type Output = f64;

    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl IndexMut<Axis> for Point3 {
    fn index_mut(&mut self, axis: Axis) -> &mut Self::Output {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_point_vector_ops() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let q = Point3::new(0.0, 4.0, 1.0);

        assert_eq!(p - q, Vec3::new(1.0, -2.0, 2.0));
        assert_eq!(q + (p - q), p);
        assert_eq!(p - Vec3::new(1.0, 2.0, 3.0), Point3::origin());
    }

    #[test]
    fn test_dist() {
        let o = Point3::origin();
        let p = Point3::new(3.0, 4.0, 0.0);

        assert_eq!(o.dist(&p), 5.0);
        assert_eq!(p.dist(&o), 5.0);
    }

    #[test]
    fn test_lerp() {
        let a = Point3::origin();
        let b = Point3::new(2.0, -2.0, 4.0);

        assert_eq!(Point3::lerp(a, b, 0.5), Point3::new(1.0, -1.0, 2.0));
        assert_eq!(Point3::lerp(a, b, -1.0), a);
        assert_eq!(Point3::lerp(a, b, 2.0), b);
    }

    proptest! {
        #[test]
        fn prop_clip_stays_in_range(
            x in -1e9_f64..1e9,
            y in -1e9_f64..1e9,
            z in -1e9_f64..1e9,
        ) {
            let min = Point3::new(-1.0, 0.0, -5.0);
            let max = Point3::new(1.0, 10.0, 5.0);

            let c = Point3::new(x, y, z).clip(min, max);

            prop_assert!(c.x >= min.x && c.x <= max.x);
            prop_assert!(c.y >= min.y && c.y <= max.y);
            prop_assert!(c.z >= min.z && c.z <= max.z);
        }
    }
}
