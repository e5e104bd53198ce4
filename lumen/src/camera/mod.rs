mod calibrated;

pub use calibrated::{Calibrated, Distortion};

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use serde::{Deserialize, Serialize};

use geom::{sample, Distance, Point3, Vec3};

use crate::{
    error::{Error, Result},
    Ray,
};

/// Cameras turn normalized image coordinates `(s, t) ∈ [0, 1]²`, anchored at
/// the lower-left of the image plane, into primary rays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Data")]
pub enum Camera {
    Orthographic(Orthographic),
    Pinhole(Pinhole),
    Focusable(Focusable),
    Calibrated(Calibrated),

    /// Wraps a parametric camera builder. The builder closure cannot travel
    /// through JSON, so this variant does not serialize.
    #[serde(skip)]
    Animated(Animated),
}

/// Casts parallel rays: every ray shares the view direction and only the
/// origin moves across the image plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orthographic {
    pub look_from: Point3,
    pub look_at: Point3,
    pub vup: Vec3,
    pub fov_width: Distance,
    pub fov_height: Distance,
}

/// A raw pinhole camera over an explicit image-plane basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pinhole {
    pub lower_left: Point3,
    pub origin: Point3,
    pub horizontal: Vec3,
    pub vertical: Vec3,
}

/// A thin-lens camera: rays start on an aperture disk and converge on the
/// focal plane at the working distance, which puts everything off that plane
/// out of focus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Focusable {
    pub look_from: Point3,
    pub look_at: Point3,
    pub vup: Vec3,

    /// Unitless horizontal span of the image plane per unit of working
    /// distance.
    pub fov_width: f64,
    pub fov_height: f64,

    pub aperture: Distance,
    pub working_distance: Distance,
}

/// A camera whose pose is a function of a parameter `u`, wrapped into
/// `[0, 1)` over a period. Useful for turntables and flythroughs.
#[derive(Clone)]
pub struct Animated {
    builder: Arc<dyn Fn(f64) -> Camera + Send + Sync>,
    u: f64,
    period: f64,
}

/// The `(u, v, w)` view basis used by the look-at cameras. `w` points from
/// the target back towards the camera.
pub(crate) fn view_basis(look_from: Point3, look_at: Point3, vup: Vec3) -> (Vec3, Vec3, Vec3) {
    let w = (look_from - look_at).normalized();
    let u = vup.cross(&w).normalized();
    let v = w.cross(&u);

    (u, v, w)
}

fn validate_look_at(look_from: Point3, look_at: Point3, vup: Vec3) -> Result<()> {
    const EPS: f64 = 1e-6;

    if vup.is_zero() || !vup.is_finite() {
        return Err(Error::validation("camera vup is degenerate"));
    }

    if (look_from - look_at).norm() < EPS {
        return Err(Error::validation(
            "camera look-from and look-at coincide",
        ));
    }

    let (u, v, w) = view_basis(look_from, look_at, vup);
    if u.dot(&v).abs() > EPS || v.dot(&w).abs() > EPS || u.dot(&w).abs() > EPS {
        return Err(Error::validation("camera basis is not orthogonal"));
    }

    Ok(())
}

impl Camera {
    /// Cast the primary ray through the normalized image point `(s, t)`.
    pub fn cast(&self, s: f64, t: f64, rng: &mut impl Rng) -> Ray {
        match self {
            Camera::Orthographic(c) => c.cast(s, t),
            Camera::Pinhole(c) => c.cast(s, t),
            Camera::Focusable(c) => c.cast(s, t, rng),
            Camera::Calibrated(c) => c.cast(s, t),
            Camera::Animated(c) => c.camera().cast(s, t, rng),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Camera::Orthographic(c) => c.validate(),
            Camera::Pinhole(c) => c.validate(),
            Camera::Focusable(c) => c.validate(),
            Camera::Calibrated(c) => c.validate(),
            Camera::Animated(c) => c.camera().validate(),
        }
    }
}

impl Orthographic {
    pub fn cast(&self, s: f64, t: f64) -> Ray {
        let (u, v, _) = view_basis(self.look_from, self.look_at, self.vup);

        let origin = self.look_from
            + u * (self.fov_width.as_nm() * (s - 0.5))
            + v * (self.fov_height.as_nm() * (t - 0.5));

        Ray::new(origin, (self.look_at - self.look_from).normalized())
    }

    pub fn validate(&self) -> Result<()> {
        if self.fov_width <= Distance::ZERO || self.fov_height <= Distance::ZERO {
            return Err(Error::validation("orthographic FOV must be positive"));
        }

        validate_look_at(self.look_from, self.look_at, self.vup)
    }
}

impl Pinhole {
    pub fn cast(&self, s: f64, t: f64) -> Ray {
        let target = self.lower_left + self.horizontal * s + self.vertical * t;

        Ray::new(self.origin, (target - self.origin).normalized())
    }

    pub fn validate(&self) -> Result<()> {
        const EPS: f64 = 1e-6;

        if self.horizontal.is_zero() || self.vertical.is_zero() {
            return Err(Error::validation("pinhole image plane is degenerate"));
        }

        let h = self.horizontal.normalized();
        let v = self.vertical.normalized();
        if h.dot(&v).abs() > EPS {
            return Err(Error::validation("pinhole image plane is not orthogonal"));
        }

        Ok(())
    }
}

impl Focusable {
    pub fn cast(&self, s: f64, t: f64, rng: &mut impl Rng) -> Ray {
        let (u, v, w) = view_basis(self.look_from, self.look_at, self.vup);

        let wd = self.working_distance.as_nm();

        // the pixel on the focal plane, spans scaled by the working distance
        let focal_target = self.look_from - w * wd
            + u * (self.fov_width * wd * (s - 0.5))
            + v * (self.fov_height * wd * (t - 0.5));

        let disk = sample::in_unit_disk(rng) * (self.aperture.as_nm() / 2.0);
        let origin = self.look_from + u * disk.x + v * disk.y;

        Ray::new(origin, (focal_target - origin).normalized())
    }

    pub fn validate(&self) -> Result<()> {
        if self.fov_width <= 0.0 || self.fov_height <= 0.0 {
            return Err(Error::validation("focusable FOV must be positive"));
        }

        if self.aperture < Distance::ZERO {
            return Err(Error::validation("focusable aperture must be non-negative"));
        }

        if self.working_distance <= Distance::ZERO {
            return Err(Error::validation(
                "focusable working distance must be positive",
            ));
        }

        validate_look_at(self.look_from, self.look_at, self.vup)
    }
}

impl Animated {
    /// Create a new `Animated` camera at `u = 0`.
    pub fn new(builder: impl Fn(f64) -> Camera + Send + Sync + 'static, period: f64) -> Self {
        Animated {
            builder: Arc::new(builder),
            u: 0.0,
            period,
        }
    }

    /// Move the camera to parameter `u`.
    pub fn with_u(mut self, u: f64) -> Self {
        self.u = u;
        self
    }

    /// The camera at the current parameter, with `u` wrapped into `[0, 1)`
    /// over the period.
    pub fn camera(&self) -> Camera {
        let phase = (self.u / self.period).rem_euclid(1.0);

        (self.builder)(phase)
    }
}

impl fmt::Debug for Animated {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Animated")
            .field("u", &self.u)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}
