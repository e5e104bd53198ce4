use serde::{Deserialize, Serialize};

use geom::{Point3, Vec3};

use crate::{
    error::{Error, Result},
    Ray,
};

use super::{validate_look_at, view_basis};

/// OpenCV lens distortion coefficients. With `k4..k6` at zero this is the
/// classic 5-parameter model, otherwise the 8-parameter rational model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,

    #[serde(default)]
    pub k4: f64,
    #[serde(default)]
    pub k5: f64,
    #[serde(default)]
    pub k6: f64,
}

/// A camera described by an [OpenCV calibration][0]: a pinhole intrinsic
/// matrix plus radial and tangential lens distortion. Image coordinates are
/// undistorted before the ray leaves through the `(u, v, w)` view basis.
///
/// [0]: https://docs.opencv.org/4.x/d9/d0c/group__calib3d.html
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibrated {
    pub width: u32,
    pub height: u32,

    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,

    #[serde(default)]
    pub distortion: Distortion,

    pub look_from: Point3,
    pub look_at: Point3,
    pub vup: Vec3,
}

const UNDISTORT_ITERATIONS: u32 = 8;

impl Distortion {
    /// Apply the distortion model to normalized camera coordinates.
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;

        let radial = self.radial(r2);
        let (dx, dy) = self.tangential(x, y, r2);

        (x * radial + dx, y * radial + dy)
    }

    /// Invert `distort` by fixed-point Newton iteration.
    pub fn undistort(&self, xd: f64, yd: f64) -> (f64, f64) {
        let (mut x, mut y) = (xd, yd);

        for _ in 0..UNDISTORT_ITERATIONS {
            let r2 = x * x + y * y;

            let radial = self.radial(r2);
            let (dx, dy) = self.tangential(x, y, r2);

            x = (xd - dx) / radial;
            y = (yd - dy) / radial;
        }

        (x, y)
    }

    fn radial(&self, r2: f64) -> f64 {
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6)
            / (1.0 + self.k4 * r2 + self.k5 * r4 + self.k6 * r6)
    }

    fn tangential(&self, x: f64, y: f64, r2: f64) -> (f64, f64) {
        (
            2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x),
            self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y,
        )
    }
}

impl Calibrated {
    pub fn cast(&self, s: f64, t: f64) -> Ray {
        // (s, t) anchors at the lower-left while image pixels count from the
        // top-left with y growing downwards
        let px = s * f64::from(self.width - 1);
        let py = (1.0 - t) * f64::from(self.height - 1);

        let xd = (px - self.cx) / self.fx;
        let yd = (py - self.cy) / self.fy;

        let (x, y) = self.distortion.undistort(xd, yd);

        // camera space looks down -Z with image y pointing down
        let d = Vec3::new(x, -y, -1.0).normalized();

        let (u, v, w) = view_basis(self.look_from, self.look_at, self.vup);
        let dir = (u * d.x + v * d.y + w * d.z).normalized();

        Ray::new(self.look_from, dir)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::validation("calibrated image size must be positive"));
        }

        if self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(Error::validation("calibrated focal lengths must be positive"));
        }

        validate_look_at(self.look_from, self.look_at, self.vup)
    }
}
