mod bvh;
mod cylinder;
mod mesh;
mod quad;
mod sphere;
mod transformed;
mod triangle;

pub use bvh::{Bvh, Group};
pub use cylinder::Cylinder;
pub use mesh::Mesh;
pub use quad::Quad;
pub use sphere::{Sphere, UvMapping};
pub use transformed::Transformed;
pub use triangle::{Face, Triangle, TriangleUv, Vertex};

use serde::{Deserialize, Serialize};

use geom::{Aabb, Distance, Point2, Point3, Vec3};

use crate::{error::Result, Ray};

/// The `t` below which an intersection is considered to be the surface the
/// ray just left and is therefore ignored.
pub const T_MIN: Distance = Distance::nm(1e-6);

/// Tolerance admitting edge and vertex hits in triangle intersections.
pub(crate) const EDGE_EPSILON: f64 = 1e-9;

/// Cross products shorter than this mark a triangle as degenerate.
pub(crate) const DEGENERATE_EPSILON: f64 = 1e-12;

/// A successful intersection between a `Ray` and a `Shape`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceHit {
    /// `t` parameter wrt the `Ray` that generated this hit.
    pub t: Distance,

    /// Point on the surface the ray hit.
    pub point: Point3,

    /// Unit surface normal at `point`.
    pub normal: Vec3,

    /// Surface parameterization at `point`, used to index textures.
    pub uv: Point2,
}

/// Anything a ray can hit.
///
/// Every variant supports intersecting a ray within an open `(t_min, t_max]`
/// window, reporting a bounding box and validating its own construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Data")]
pub enum Shape {
    Sphere(Sphere),
    Cylinder(Cylinder),
    Quad(Quad),
    Triangle(Triangle),
    TriangleUv(TriangleUv),
    Face(Face),
    Mesh(Mesh),
    Bvh(Bvh),
    Group(Group),
    Transformed(Transformed),
}

impl Shape {
    /// Calculate the intersection of `ray` with this shape closest to the ray
    /// origin, if any. Only hits with `t_min < t <= t_max` count.
    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        match self {
            Shape::Sphere(s) => s.collide(ray, t_min, t_max),
            Shape::Cylinder(c) => c.collide(ray, t_min, t_max),
            Shape::Quad(q) => q.collide(ray, t_min, t_max),
            Shape::Triangle(t) => t.collide(ray, t_min, t_max),
            Shape::TriangleUv(t) => t.collide(ray, t_min, t_max),
            Shape::Face(f) => f.collide(ray, t_min, t_max),
            Shape::Mesh(m) => m.collide(ray, t_min, t_max),
            Shape::Bvh(b) => b.collide(ray, t_min, t_max),
            Shape::Group(g) => g.collide(ray, t_min, t_max),
            Shape::Transformed(t) => t.collide(ray, t_min, t_max),
        }
    }

    /// Return an `Aabb` containing the shape.
    pub fn bounds(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.bounds(),
            Shape::Cylinder(c) => c.bounds(),
            Shape::Quad(q) => q.bounds(),
            Shape::Triangle(t) => t.bounds(),
            Shape::TriangleUv(t) => t.bounds(),
            Shape::Face(f) => f.bounds(),
            Shape::Mesh(m) => m.bounds(),
            Shape::Bvh(b) => b.bounds(),
            Shape::Group(g) => g.bounds(),
            Shape::Transformed(t) => t.bounds(),
        }
    }

    /// Check shape-specific well-formedness.
    pub fn validate(&self) -> Result<()> {
        match self {
            Shape::Sphere(s) => s.validate(),
            Shape::Cylinder(c) => c.validate(),
            Shape::Quad(q) => q.validate(),
            Shape::Triangle(t) => t.validate(),
            Shape::TriangleUv(t) => t.validate(),
            Shape::Face(f) => f.validate(),
            Shape::Mesh(m) => m.validate(),
            Shape::Bvh(b) => b.validate(),
            Shape::Group(g) => g.validate(),
            Shape::Transformed(t) => t.validate(),
        }
    }
}
