use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use geom::{Aabb, Distance, Point2, Point3, Vec3};

use crate::{
    error::{Error, Result},
    Ray,
};

use super::SurfaceHit;

/// A finite cylinder with caps, running from `base` along `axis` for
/// `height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub base: Point3,
    pub axis: Vec3,
    pub radius: Distance,
    pub height: Distance,
}

impl Cylinder {
    /// Create a new `Cylinder`. The axis is normalized on construction.
    pub fn new(base: Point3, axis: Vec3, radius: Distance, height: Distance) -> Self {
        Cylinder {
            base,
            axis: axis.normalized(),
            radius,
            height,
        }
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        let mut best: Option<SurfaceHit> = None;
        let mut keep_nearest = |hit: Option<SurfaceHit>| {
            if let Some(hit) = hit {
                if best.as_ref().map_or(true, |b| hit.t < b.t) {
                    best = Some(hit);
                }
            }
        };

        keep_nearest(self.collide_lateral(ray, t_min, t_max));
        keep_nearest(self.collide_cap(ray, t_min, t_max, Distance::ZERO, -self.axis));
        keep_nearest(self.collide_cap(ray, t_min, t_max, self.height, self.axis));

        best
    }

    /// Intersect the lateral surface by projecting the ray onto the plane
    /// perpendicular to the axis and solving the resulting quadratic.
    fn collide_lateral(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        let d = self.axis;
        let r = self.radius.as_nm();
        let h = self.height.as_nm();

        let w = ray.origin - self.base;

        let dir_perp = ray.dir - d * ray.dir.dot(&d);
        let w_perp = w - d * w.dot(&d);

        let a = dir_perp.dot(&dir_perp);
        if a == 0.0 {
            // the ray runs parallel to the axis, only the caps can be hit
            return None;
        }

        let b = 2.0 * w_perp.dot(&dir_perp);
        let c = w_perp.dot(&w_perp) - r * r;

        let discr = b * b - 4.0 * a * c;
        if discr.is_sign_negative() {
            return None;
        }

        let sq = discr.sqrt();

        [(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)]
            .into_iter()
            .map(Distance::nm)
            .filter(|t| *t > t_min && *t <= t_max)
            .find_map(|t| {
                let point = ray.point_at(t);
                let y = (point - self.base).dot(&d);
                if !(0.0..=h).contains(&y) {
                    return None;
                }

                let radial = (point - self.base - d * y) / r;
                let mut u = radial_angle(radial, d) / (2.0 * PI);
                if u < 0.0 {
                    u += 1.0;
                }

                Some(SurfaceHit {
                    t,
                    point,
                    normal: radial,
                    uv: Point2::new(u, y / h),
                })
            })
    }

    /// Intersect the disk capping the cylinder at `offset` along the axis.
    fn collide_cap(
        &self,
        ray: &Ray,
        t_min: Distance,
        t_max: Distance,
        offset: Distance,
        normal: Vec3,
    ) -> Option<SurfaceHit> {
        let d = self.axis;
        let r = self.radius.as_nm();

        let center = self.base + d * offset.as_nm();

        let denom = ray.dir.dot(&d);
        if denom == 0.0 {
            return None;
        }

        let t = Distance::nm((center - ray.origin).dot(&d) / denom);
        if t <= t_min || t > t_max {
            return None;
        }

        let point = ray.point_at(t);
        let radial = point - center;
        if radial.norm2() > r * r {
            return None;
        }

        let (bu, bv) = cap_basis(d);
        let uv = Point2::new(
            radial.dot(&bu) / (2.0 * r) + 0.5,
            radial.dot(&bv) / (2.0 * r) + 0.5,
        );

        Some(SurfaceHit {
            t,
            point,
            normal,
            uv,
        })
    }

    pub fn bounds(&self) -> Aabb {
        let r = self.radius.as_nm();
        let top = self.base + self.axis * self.height.as_nm();

        // per-axis extent of the two cap disks
        let d = self.axis;
        let pad = Vec3::new(
            (1.0 - d.x * d.x).max(0.0).sqrt() * r,
            (1.0 - d.y * d.y).max(0.0).sqrt() * r,
            (1.0 - d.z * d.z).max(0.0).sqrt() * r,
        );

        Aabb::new(self.base - pad)
            .expanded(&(self.base + pad))
            .expanded(&(top - pad))
            .expanded(&(top + pad))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.axis.is_finite() || (self.axis.norm() - 1.0).abs() > 1e-6 {
            return Err(Error::validation("cylinder axis must be unit length"));
        }

        if !self.radius.is_finite() || self.radius <= Distance::ZERO {
            return Err(Error::validation("cylinder radius must be positive"));
        }

        if !self.height.is_finite() || self.height <= Distance::ZERO {
            return Err(Error::validation("cylinder height must be positive"));
        }

        Ok(())
    }
}

/// Two unit vectors spanning the plane perpendicular to `d`.
fn cap_basis(d: Vec3) -> (Vec3, Vec3) {
    let helper = if d.x.abs() > 0.9 {
        Vec3::new(0.0, 1.0, 0.0)
    } else {
        Vec3::new(1.0, 0.0, 0.0)
    };

    let u = d.cross(&helper).normalized();
    let v = d.cross(&u);

    (u, v)
}

/// Angle of `radial` within the plane perpendicular to `d`.
fn radial_angle(radial: Vec3, d: Vec3) -> f64 {
    let (u, v) = cap_basis(d);
    radial.dot(&v).atan2(radial.dot(&u))
}

#[cfg(test)]
mod tests {
    use super::super::T_MIN;
    use super::*;

    fn z_cylinder() -> Cylinder {
        // base at the origin, running up the Z axis
        Cylinder::new(
            Point3::origin(),
            Vec3::new(0.0, 0.0, 1.0),
            Distance::nm(1.0),
            Distance::nm(2.0),
        )
    }

    #[test]
    fn test_lateral_hit() {
        let c = z_cylinder();

        let ray = Ray::new(Point3::new(-5.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = c.collide(&ray, T_MIN, Distance::INFINITY).unwrap();

        assert_eq!(hit.t, Distance::nm(4.0));
        assert_eq!(hit.point, Point3::new(-1.0, 0.0, 1.0));
        assert_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_lateral_respects_height() {
        let c = z_cylinder();

        let ray = Ray::new(Point3::new(-5.0, 0.0, 3.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(c.collide(&ray, T_MIN, Distance::INFINITY).is_none());
    }

    #[test]
    fn test_cap_hits() {
        let c = z_cylinder();

        // from above, hits the top cap
        let ray = Ray::new(Point3::new(0.2, 0.3, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = c.collide(&ray, T_MIN, Distance::INFINITY).unwrap();
        assert_eq!(hit.t, Distance::nm(3.0));
        assert_eq!(hit.normal, Vec3::new(0.0, 0.0, 1.0));

        // from below, hits the bottom cap
        let ray = Ray::new(Point3::new(0.2, 0.3, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = c.collide(&ray, T_MIN, Distance::INFINITY).unwrap();
        assert_eq!(hit.t, Distance::nm(5.0));
        assert_eq!(hit.normal, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_nearest_hit_wins() {
        let c = z_cylinder();

        // grazing the lateral surface before reaching the far cap
        let ray = Ray::new(Point3::new(-5.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = c.collide(&ray, T_MIN, Distance::INFINITY).unwrap();
        assert_eq!(hit.point, Point3::new(-1.0, 0.0, 1.0));
    }

    #[test]
    fn test_tilted_axis() {
        let c = Cylinder::new(
            Point3::origin(),
            Vec3::new(0.0, 1.0, 1.0),
            Distance::nm(0.5),
            Distance::nm(3.0),
        );

        let mid = Point3::origin() + c.axis * 1.5;
        let ray = Ray::new(
            Point3::new(10.0, mid.y, mid.z),
            Vec3::new(-1.0, 0.0, 0.0),
        );

        let hit = c.collide(&ray, T_MIN, Distance::INFINITY).unwrap();
        assert!(hit.normal.dot(&c.axis).abs() < 1e-9);
        assert!(c.bounds().contains(&hit.point));
    }

    #[test]
    fn test_validate() {
        assert!(z_cylinder().validate().is_ok());

        assert!(Cylinder::new(
            Point3::origin(),
            Vec3::zero(),
            Distance::nm(1.0),
            Distance::nm(1.0)
        )
        .validate()
        .is_err());

        assert!(Cylinder::new(
            Point3::origin(),
            Vec3::new(0.0, 0.0, 1.0),
            Distance::ZERO,
            Distance::nm(1.0)
        )
        .validate()
        .is_err());
    }
}
