use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A length expressed in nanometers.
///
/// All the lengths in a scene use this unit. The type is a thin wrapper over
/// a `f64`, but it only implements the operations that keep the unit a plain
/// length: two `Distance` cannot be multiplied together, which would silently
/// produce square nanometers.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance(f64);

impl Distance {
    pub const ZERO: Distance = Distance(0.0);
    pub const INFINITY: Distance = Distance(f64::INFINITY);

    /// Create a `Distance` from nanometers.
    pub const fn nm(nm: f64) -> Self {
        Distance(nm)
    }

    /// Create a `Distance` from micrometers.
    pub const fn um(um: f64) -> Self {
        Distance(um * 1e3)
    }

    /// Create a `Distance` from millimeters.
    pub const fn mm(mm: f64) -> Self {
        Distance(mm * 1e6)
    }

    /// Create a `Distance` from meters.
    pub const fn m(m: f64) -> Self {
        Distance(m * 1e9)
    }

    /// The raw value in nanometers.
    pub const fn as_nm(self) -> f64 {
        self.0
    }

    /// The value converted to meters.
    pub fn as_m(self) -> f64 {
        self.0 * 1e-9
    }

    /// Check that the length is neither NaN nor infinite.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Total ordering over distances, NaN sorting last.
    pub fn total_cmp(&self, other: &Distance) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for Distance {
    type Output = Distance;

    fn add(self, d: Distance) -> Self::Output {
        Distance(self.0 + d.0)
    }
}

impl AddAssign for Distance {
    fn add_assign(&mut self, d: Distance) {
        self.0 += d.0;
    }
}

impl Sub for Distance {
    type Output = Distance;

    fn sub(self, d: Distance) -> Self::Output {
        Distance(self.0 - d.0)
    }
}

impl SubAssign for Distance {
    fn sub_assign(&mut self, d: Distance) {
        self.0 -= d.0;
    }
}

impl Mul<f64> for Distance {
    type Output = Distance;

    fn mul(self, s: f64) -> Self::Output {
        Distance(self.0 * s)
    }
}

impl Div<f64> for Distance {
    type Output = Distance;

    fn div(self, s: f64) -> Self::Output {
        Distance(self.0 / s)
    }
}

impl Div for Distance {
    type Output = f64;

    /// The ratio of two lengths is a plain scalar.
    fn div(self, d: Distance) -> Self::Output {
        self.0 / d.0
    }
}

impl Neg for Distance {
    type Output = Distance;

    fn neg(self) -> Self::Output {
        Distance(-self.0)
    }
}
