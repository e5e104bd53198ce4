use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::{Point3, Vec3};

/// A 3×3 matrix, mainly used to represent rotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    /// Raw coefficients in row-major order.
    pub data: [[f64; 3]; 3],
}

impl Mat3 {
    /// Create the identity matrix.
    pub fn identity() -> Self {
        Mat3 {
            data: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Create a rotation matrix around the X axis by the given angle in
    /// radians.
    pub fn rotate_x(a: f64) -> Self {
        let (s, c) = a.sin_cos();

        Mat3 {
            data: [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
        }
    }

    /// Create a rotation matrix around the Y axis by the given angle in
    /// radians.
    pub fn rotate_y(a: f64) -> Self {
        let (s, c) = a.sin_cos();

        Mat3 {
            data: [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
        }
    }

    /// Create a rotation matrix around the Z axis by the given angle in
    /// radians.
    pub fn rotate_z(a: f64) -> Self {
        let (s, c) = a.sin_cos();

        Mat3 {
            data: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Return the transpose of the matrix. For a pure rotation this is also
    /// its inverse.
    pub fn transpose(&self) -> Self {
        let mut data = [[0.0; 3]; 3];

        for (r, row) in data.iter_mut().enumerate() {
            for (c, e) in row.iter_mut().enumerate() {
                *e = self.data[c][r];
            }
        }

        Mat3 { data }
    }
}

impl Mul<Vec3> for &Mat3 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Self::Output {
        let m = &self.data;

        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }
}

impl Mul<Point3> for &Mat3 {
    type Output = Point3;

    fn mul(self, p: Point3) -> Self::Output {
        let v = self * p.to_vec3();
        Point3::new(v.x, v.y, v.z)
    }
}

impl Mul for &Mat3 {
    type Output = Mat3;

    fn mul(self, other: &Mat3) -> Self::Output {
        let mut data = [[0.0; 3]; 3];

        for (r, row) in data.iter_mut().enumerate() {
            for (c, e) in row.iter_mut().enumerate() {
                *e = self.data[r][0] * other.data[0][c]
                    + self.data[r][1] * other.data[1][c]
                    + self.data[r][2] * other.data[2][c];
            }
        }

        Mat3 { data }
    }
}
