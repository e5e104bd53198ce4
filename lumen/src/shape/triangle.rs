use serde::{Deserialize, Serialize};

use geom::{Aabb, Distance, Point2, Point3, Vec3};

use crate::{
    error::{Error, Result},
    Ray,
};

use super::{SurfaceHit, DEGENERATE_EPSILON, EDGE_EPSILON};

/// A plain triangle. The normal is derived from the vertices and is
/// face-fixed: it is never flipped towards the ray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
}

/// A triangle with per-vertex UV coordinates and a stored unit normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleUv {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
    pub uv_a: Point2,
    pub uv_b: Point2,
    pub uv_c: Point2,
    pub normal: Vec3,
}

/// A vertex of a mesh `Face`: a position plus its UV coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3,
    pub uv: Point2,
}

/// A mesh-ready triangle with per-vertex positions and UVs and a stored unit
/// normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: [Vertex; 3],
    pub normal: Vec3,
}

/// [Möller–Trumbore][0] ray/triangle intersection. Returns `(t, u, v)` where
/// `(u, v)` are the barycentric coordinates of the hit. Edge and vertex hits
/// are admitted through a small tolerance.
///
/// [0]: https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm
pub(crate) fn moller_trumbore(
    p0: Point3,
    p1: Point3,
    p2: Point3,
    ray: &Ray,
    t_min: Distance,
    t_max: Distance,
) -> Option<(Distance, f64, f64)> {
    let e1 = p1 - p0;
    let e2 = p2 - p0;

    let p = ray.dir.cross(&e2);

    let det = e1.dot(&p);
    if det.abs() < DEGENERATE_EPSILON {
        return None;
    }

    let inv = 1.0 / det;
    let s = ray.origin - p0;
    let u = s.dot(&p) * inv;
    if u < -EDGE_EPSILON {
        return None;
    }

    let q = s.cross(&e1);
    let v = ray.dir.dot(&q) * inv;
    if v < -EDGE_EPSILON || u + v > 1.0 + EDGE_EPSILON {
        return None;
    }

    let t = Distance::nm(e2.dot(&q) * inv);
    if t > t_min && t <= t_max {
        Some((t, u, v))
    } else {
        None
    }
}

/// Shared vertex checks: no two vertices identical, no colinear vertices.
fn validate_vertices(a: Point3, b: Point3, c: Point3) -> Result<()> {
    if a == b || b == c || a == c {
        return Err(Error::validation("triangle has identical vertices"));
    }

    let cross = (b - a).cross(&(c - a));
    if cross.norm() < DEGENERATE_EPSILON {
        return Err(Error::validation("triangle vertices are colinear"));
    }

    Ok(())
}

/// Check a stored normal against the triangle it belongs to: it must be unit
/// length, orthogonal to both edges and point along the edge cross product.
fn validate_stored_normal(a: Point3, b: Point3, c: Point3, normal: Vec3) -> Result<()> {
    const EPS: f64 = 1e-6;

    if (normal.norm() - 1.0).abs() > EPS {
        return Err(Error::validation("triangle normal is not unit length"));
    }

    let e0 = b - a;
    let e1 = c - a;
    if normal.dot(&e0).abs() > EPS * e0.norm() || normal.dot(&e1).abs() > EPS * e1.norm() {
        return Err(Error::validation("triangle normal is not orthogonal to its edges"));
    }

    if normal.dot(&e0.cross(&e1)) <= 0.0 {
        return Err(Error::validation(
            "triangle normal points against the vertex winding",
        ));
    }

    Ok(())
}

impl Triangle {
    /// Create a new `Triangle` from its vertices.
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Triangle { a, b, c }
    }

    /// The geometric normal, `(b - a) × (c - a)` normalized.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(&(self.c - self.a)).normalized()
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        let (t, u, v) = moller_trumbore(self.a, self.b, self.c, ray, t_min, t_max)?;

        Some(SurfaceHit {
            t,
            point: ray.point_at(t),
            normal: self.normal(),
            uv: Point2::new(u, v),
        })
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.a).expanded(&self.b).expanded(&self.c)
    }

    pub fn validate(&self) -> Result<()> {
        validate_vertices(self.a, self.b, self.c)
    }
}

impl TriangleUv {
    /// Create a new `TriangleUv`, deriving the stored normal from the vertex
    /// winding.
    pub fn new(
        (a, uv_a): (Point3, Point2),
        (b, uv_b): (Point3, Point2),
        (c, uv_c): (Point3, Point2),
    ) -> Self {
        let normal = (b - a).cross(&(c - a)).normalized();

        TriangleUv {
            a,
            b,
            c,
            uv_a,
            uv_b,
            uv_c,
            normal,
        }
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        let (t, u, v) = moller_trumbore(self.a, self.b, self.c, ray, t_min, t_max)?;

        let uv = self.uv_a * (1.0 - u - v) + self.uv_b * u + self.uv_c * v;

        Some(SurfaceHit {
            t,
            point: ray.point_at(t),
            normal: self.normal,
            uv,
        })
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.a).expanded(&self.b).expanded(&self.c)
    }

    pub fn validate(&self) -> Result<()> {
        validate_vertices(self.a, self.b, self.c)?;
        validate_stored_normal(self.a, self.b, self.c, self.normal)
    }
}

impl Vertex {
    pub fn new(position: Point3, uv: Point2) -> Self {
        Vertex { position, uv }
    }
}

impl Face {
    /// Create a new `Face`, deriving the stored normal from the vertex
    /// winding.
    pub fn new(vertices: [Vertex; 3]) -> Self {
        let [v0, v1, v2] = &vertices;
        let normal = (v1.position - v0.position)
            .cross(&(v2.position - v0.position))
            .normalized();

        Face { vertices, normal }
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        let [v0, v1, v2] = &self.vertices;

        let (t, u, v) = moller_trumbore(v0.position, v1.position, v2.position, ray, t_min, t_max)?;

        let w = 1.0 - u - v;
        let uv = v0.uv * w + v1.uv * u + v2.uv * v;

        Some(SurfaceHit {
            t,
            point: ray.point_at(t),
            normal: self.normal,
            uv,
        })
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.vertices[0].position)
            .expanded(&self.vertices[1].position)
            .expanded(&self.vertices[2].position)
    }

    pub fn validate(&self) -> Result<()> {
        let [v0, v1, v2] = &self.vertices;

        validate_vertices(v0.position, v1.position, v2.position)?;
        validate_stored_normal(v0.position, v1.position, v2.position, self.normal)
    }
}
