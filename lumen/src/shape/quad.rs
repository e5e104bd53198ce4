use serde::{Deserialize, Serialize};

use geom::{Aabb, Distance, Point2, Point3, Vec3};

use crate::{
    error::{Error, Result},
    Ray,
};

use super::{triangle::moller_trumbore, SurfaceHit};

/// A rectangle centered at `center`, facing `normal`, spanning `width` ×
/// `height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub center: Point3,
    pub normal: Vec3,
    pub width: Distance,
    pub height: Distance,
}

impl Quad {
    /// Create a new `Quad`. The normal is normalized on construction.
    pub fn new(center: Point3, normal: Vec3, width: Distance, height: Distance) -> Self {
        Quad {
            center,
            normal: normal.normalized(),
            width,
            height,
        }
    }

    /// The orthonormal `(u, v)` basis spanning the quad plane, built by
    /// crossing the normal with an axis it is not parallel to. Width runs
    /// along `u`, height along `v`.
    fn basis(&self) -> (Vec3, Vec3) {
        let helper = if self.normal.y.abs() > 0.9 {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            Vec3::new(0.0, 1.0, 0.0)
        };

        let u = helper.cross(&self.normal).normalized();
        let v = self.normal.cross(&u);

        (u, v)
    }

    /// The four corners, counterclockwise starting from the `(0, 0)` UV
    /// corner.
    fn corners(&self) -> [Point3; 4] {
        let (u, v) = self.basis();

        let hw = u * (self.width.as_nm() / 2.0);
        let hh = v * (self.height.as_nm() / 2.0);

        let p0 = self.center - hw - hh;
        let p1 = self.center + hw - hh;
        let p2 = self.center + hw + hh;
        let p3 = self.center - hw + hh;

        [p0, p1, p2, p3]
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        let [p0, p1, p2, p3] = self.corners();

        // fan decomposition from p0, keep the nearer triangle hit
        let t = match (
            moller_trumbore(p0, p1, p2, ray, t_min, t_max),
            moller_trumbore(p0, p2, p3, ray, t_min, t_max),
        ) {
            (Some((t0, ..)), Some((t1, ..))) => {
                if t0 <= t1 {
                    t0
                } else {
                    t1
                }
            }
            (Some((t, ..)), None) | (None, Some((t, ..))) => t,
            (None, None) => return None,
        };

        let point = ray.point_at(t);

        let (u, v) = self.basis();
        let local = point - p0;
        let uv = Point2::new(
            local.dot(&u) / self.width.as_nm(),
            local.dot(&v) / self.height.as_nm(),
        )
        .clip(Point2::origin(), Point2::new(1.0, 1.0));

        Some(SurfaceHit {
            t,
            point,
            normal: self.normal,
            uv,
        })
    }

    pub fn bounds(&self) -> Aabb {
        let [p0, p1, p2, p3] = self.corners();

        Aabb::new(p0).expanded(&p1).expanded(&p2).expanded(&p3)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.normal.is_finite() || (self.normal.norm() - 1.0).abs() > 1e-6 {
            return Err(Error::validation("quad normal must be unit length"));
        }

        if !self.width.is_finite() || self.width <= Distance::ZERO {
            return Err(Error::validation("quad width must be positive"));
        }

        if !self.height.is_finite() || self.height <= Distance::ZERO {
            return Err(Error::validation("quad height must be positive"));
        }

        Ok(())
    }
}
