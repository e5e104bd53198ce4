use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A position in 2D space, mostly used for UV coordinates on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// Create a new `Point2` with the given coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }

    /// The origin.
    pub fn origin() -> Self {
        Point2::new(0.0, 0.0)
    }

    /// Clamp both coordinates into `[min, max]` taken component-wise.
    pub fn clip(&self, min: Point2, max: Point2) -> Point2 {
        Point2::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }

    /// Check that both coordinates are neither NaN nor infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point2 {
    type Output = Point2;

    fn add(self, p: Point2) -> Self::Output {
        Point2::new(self.x + p.x, self.y + p.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, p: Point2) -> Self::Output {
        Point2::new(self.x - p.x, self.y - p.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Point2;

    fn mul(self, s: f64) -> Self::Output {
        Point2::new(self.x * s, self.y * s)
    }
}
