use serde::{Deserialize, Serialize};

use geom::{Aabb, Distance, Mat3, Point3, Vec3};

use crate::{
    error::{Error, Result},
    Ray,
};

use super::{Shape, SurfaceHit};

/// A decorator placing another shape in the world through a translation, a
/// rotation and a non-uniform scale, applied as `translate ∘ rotate ∘ scale`.
///
/// Rays are carried into the local space of the inner shape, the hit is
/// carried back out. The `t` parameter is unaffected because origin and
/// direction transform together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformed {
    pub shape: Box<Shape>,
    pub translation: Vec3,
    pub rotation: Mat3,
    pub scale: Vec3,
}

impl Transformed {
    pub fn new(shape: Shape, translation: Vec3, rotation: Mat3, scale: Vec3) -> Self {
        Transformed {
            shape: Box::new(shape),
            translation,
            rotation,
            scale,
        }
    }

    /// Decorate `shape` with a plain translation.
    pub fn translation(shape: Shape, translation: Vec3) -> Self {
        Transformed::new(shape, translation, Mat3::identity(), Vec3::new(1.0, 1.0, 1.0))
    }

    fn to_local(&self, p: Point3) -> Point3 {
        let v = &self.rotation.transpose() * (p - self.translation);

        Point3::new(v.x / self.scale.x, v.y / self.scale.y, v.z / self.scale.z)
    }

    fn to_world(&self, p: Point3) -> Point3 {
        let scaled = Vec3::new(p.x * self.scale.x, p.y * self.scale.y, p.z * self.scale.z);

        Point3::origin() + &self.rotation * scaled + self.translation
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        let inv_rot = self.rotation.transpose();

        let local_dir = {
            let d = &inv_rot * ray.dir;
            Vec3::new(d.x / self.scale.x, d.y / self.scale.y, d.z / self.scale.z)
        };

        let mut local_ray = ray.clone();
        local_ray.origin = self.to_local(ray.origin);
        local_ray.dir = local_dir;

        let hit = self.shape.collide(&local_ray, t_min, t_max)?;

        // normals transform through the inverse transpose, i.e. rotate the
        // normal scaled by the reciprocal scale
        let normal = (&self.rotation
            * Vec3::new(
                hit.normal.x / self.scale.x,
                hit.normal.y / self.scale.y,
                hit.normal.z / self.scale.z,
            ))
            .normalized();

        Some(SurfaceHit {
            t: hit.t,
            point: self.to_world(hit.point),
            normal,
            uv: hit.uv,
        })
    }

    pub fn bounds(&self) -> Aabb {
        let inner = self.shape.bounds();
        let lo = *inner.min();
        let hi = *inner.max();

        let corners = [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ];

        Aabb::from_points(corners.iter().map(|c| self.to_world(*c)))
            .expect("corner list is never empty")
    }

    pub fn validate(&self) -> Result<()> {
        const EPS: f64 = 1e-6;

        if !self.translation.is_finite() {
            return Err(Error::validation("transform translation is not finite"));
        }

        if !self.scale.is_finite()
            || self.scale.x == 0.0
            || self.scale.y == 0.0
            || self.scale.z == 0.0
        {
            return Err(Error::validation("transform scale must be non-zero"));
        }

        // the rotation must be orthogonal, i.e. its transpose is its inverse
        let id = &self.rotation * &self.rotation.transpose();
        for (r, row) in id.data.iter().enumerate() {
            for (c, e) in row.iter().enumerate() {
                let expected = if r == c { 1.0 } else { 0.0 };
                if (e - expected).abs() > EPS {
                    return Err(Error::validation("transform rotation is not orthogonal"));
                }
            }
        }

        self.shape.validate()
    }
}
