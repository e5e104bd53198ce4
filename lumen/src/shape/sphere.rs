use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use geom::{Aabb, Distance, Point2, Point3, Vec3};

use crate::{
    error::{Error, Result},
    Ray,
};

use super::SurfaceHit;

/// How the surface of a `Sphere` maps onto UV coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UvMapping {
    /// [Equirectangular projection][0]: `u` from the azimuth, `v` from the
    /// polar angle. The `north_up` flag flips `v` so that the north pole maps
    /// to the top of the texture.
    ///
    /// [0]: https://en.wikipedia.org/wiki/Equirectangular_projection
    Equirectangular { north_up: bool },

    /// Project onto the face of the surrounding cube picked by the dominant
    /// axis of the normal.
    Cubic,
}

impl Default for UvMapping {
    fn default() -> Self {
        UvMapping::Equirectangular { north_up: true }
    }
}

/// A sphere defined by its center and radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point3,
    pub radius: Distance,

    #[serde(default)]
    pub mapping: UvMapping,
}

impl Sphere {
    /// Create a new `Sphere` with the default equirectangular UV mapping.
    pub fn new(center: Point3, radius: Distance) -> Self {
        Sphere {
            center,
            radius,
            mapping: UvMapping::default(),
        }
    }

    /// Change the UV mapping of this `Sphere`.
    pub fn with_mapping(mut self, mapping: UvMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        let oc = ray.origin - self.center;
        let r = self.radius.as_nm();

        let a = ray.dir.dot(&ray.dir);
        let b = oc.dot(&ray.dir);
        let c = oc.dot(&oc) - r * r;

        let discr = b * b - a * c;
        if discr.is_sign_negative() {
            return None;
        }

        // prefer the nearer root, fall back to the farther one when the
        // origin is inside the sphere or the near root is behind t_min
        let sq = discr.sqrt();
        let t = [(-b - sq) / a, (-b + sq) / a]
            .into_iter()
            .map(Distance::nm)
            .find(|t| *t > t_min && *t <= t_max)?;

        let point = ray.point_at(t);
        let normal = (point - self.center) / r;

        Some(SurfaceHit {
            t,
            point,
            normal,
            uv: self.uv_at(normal),
        })
    }

    pub fn bounds(&self) -> Aabb {
        let r = Vec3::new(
            self.radius.as_nm(),
            self.radius.as_nm(),
            self.radius.as_nm(),
        );

        Aabb::new(self.center - r).expanded(&(self.center + r))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.center.is_finite() {
            return Err(Error::validation("sphere center is not finite"));
        }

        if !self.radius.is_finite() || self.radius <= Distance::ZERO {
            return Err(Error::validation("sphere radius must be positive"));
        }

        Ok(())
    }

    /// Map the unit normal at a surface point to UV coordinates.
    fn uv_at(&self, n: Vec3) -> Point2 {
        match self.mapping {
            UvMapping::Equirectangular { north_up } => {
                let mut u = n.z.atan2(n.x) / (2.0 * PI);
                if u < 0.0 {
                    u += 1.0;
                }

                let v = n.y.clamp(-1.0, 1.0).acos() / PI;

                Point2::new(u, if north_up { 1.0 - v } else { v })
            }
            UvMapping::Cubic => {
                let (a, b, m) = if n.x.abs() >= n.y.abs() && n.x.abs() >= n.z.abs() {
                    (n.z, n.y, n.x.abs())
                } else if n.y.abs() >= n.z.abs() {
                    (n.x, n.z, n.y.abs())
                } else {
                    (n.x, n.y, n.z.abs())
                };

                Point2::new((a / m + 1.0) / 2.0, (b / m + 1.0) / 2.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::T_MIN;
    use super::*;

    fn unit_sphere() -> Sphere {
        Sphere::new(Point3::origin(), Distance::nm(1.0))
    }

    #[test]
    fn test_collide_from_outside() {
        let s = unit_sphere();

        let ray = Ray::new(Point3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = s.collide(&ray, T_MIN, Distance::INFINITY).unwrap();

        assert_eq!(hit.t, Distance::nm(1.0));
        assert_eq!(hit.point, Point3::new(0.0, 0.0, -1.0));
        assert_eq!(hit.normal, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_collide_from_inside_picks_far_root() {
        let s = unit_sphere();

        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, 1.0));
        let hit = s.collide(&ray, T_MIN, Distance::INFINITY).unwrap();

        assert_eq!(hit.t, Distance::nm(1.0));
        assert_eq!(hit.point, Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_collide_miss() {
        let s = unit_sphere();

        // pointing away
        let ray = Ray::new(Point3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(s.collide(&ray, T_MIN, Distance::INFINITY).is_none());

        // offset beyond the radius
        let ray = Ray::new(Point3::new(0.0, 1.5, -2.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(s.collide(&ray, T_MIN, Distance::INFINITY).is_none());
    }

    #[test]
    fn test_hit_within_bounds() {
        let s = Sphere::new(Point3::new(1.0, 2.0, 3.0), Distance::nm(2.0));
        let bounds = s.bounds();

        let ray = Ray::new(Point3::new(1.0, 2.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = s.collide(&ray, T_MIN, Distance::INFINITY).unwrap();

        assert!(bounds.contains(&hit.point));
    }

    #[test]
    fn test_equirectangular_uv() {
        let s = unit_sphere();

        // +X axis maps to u = 0, equator to v = 0.5
        let uv = s.uv_at(Vec3::new(1.0, 0.0, 0.0));
        assert!((uv.x - 0.0).abs() < 1e-9);
        assert!((uv.y - 0.5).abs() < 1e-9);

        // north pole maps to the top with north_up
        let uv = s.uv_at(Vec3::new(0.0, 1.0, 0.0));
        assert!((uv.y - 1.0).abs() < 1e-9);

        let s = s.with_mapping(UvMapping::Equirectangular { north_up: false });
        let uv = s.uv_at(Vec3::new(0.0, 1.0, 0.0));
        assert!(uv.y.abs() < 1e-9);
    }

    #[test]
    fn test_cubic_uv_in_range() {
        let s = unit_sphere().with_mapping(UvMapping::Cubic);

        for n in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.5, 0.5, 0.7071).normalized(),
        ] {
            let uv = s.uv_at(n);
            assert!((0.0..=1.0).contains(&uv.x));
            assert!((0.0..=1.0).contains(&uv.y));
        }
    }

    #[test]
    fn test_validate() {
        assert!(unit_sphere().validate().is_ok());
        assert!(Sphere::new(Point3::origin(), Distance::ZERO)
            .validate()
            .is_err());
        assert!(Sphere::new(Point3::origin(), Distance::nm(-1.0))
            .validate()
            .is_err());
    }
}
