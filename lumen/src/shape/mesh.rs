use serde::{Deserialize, Serialize};

use geom::{Aabb, Distance};

use crate::{
    error::{Error, Result},
    Ray,
};

use super::{Bvh, Face, Shape, SurfaceHit};

/// A triangle mesh: a set of `Face`s behind a private BVH.
///
/// Serialization stores the flat face list and rebuilds the index on
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MeshFaces", into = "MeshFaces")]
pub struct Mesh {
    bvh: Box<Shape>,
}

#[derive(Serialize, Deserialize)]
struct MeshFaces {
    faces: Vec<Face>,
}

impl Mesh {
    /// Build a `Mesh` from its faces, partitioning them into a BVH.
    pub fn new(faces: Vec<Face>) -> Result<Self> {
        if faces.is_empty() {
            return Err(Error::validation("mesh has no faces"));
        }

        Ok(Mesh {
            bvh: Box::new(Bvh::build(faces.into_iter().map(Shape::Face).collect())),
        })
    }

    /// Collect the faces of this mesh back out of its BVH.
    pub fn faces(&self) -> Vec<Face> {
        let mut faces = vec![];
        collect_faces(&self.bvh, &mut faces);
        faces
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        self.bvh.collide(ray, t_min, t_max)
    }

    pub fn bounds(&self) -> Aabb {
        self.bvh.bounds()
    }

    pub fn validate(&self) -> Result<()> {
        self.bvh.validate()
    }
}

// a mesh BVH only ever nests faces, groups and other BVH nodes
fn collect_faces(shape: &Shape, out: &mut Vec<Face>) {
    match shape {
        Shape::Face(f) => out.push(f.clone()),
        Shape::Bvh(b) => {
            let (left, right) = b.children();
            collect_faces(left, out);
            collect_faces(right, out);
        }
        Shape::Group(g) => {
            for s in g.shapes() {
                collect_faces(s, out);
            }
        }
        _ => {}
    }
}

impl TryFrom<MeshFaces> for Mesh {
    type Error = Error;

    fn try_from(value: MeshFaces) -> Result<Self> {
        Mesh::new(value.faces)
    }
}

impl From<Mesh> for MeshFaces {
    fn from(mesh: Mesh) -> Self {
        MeshFaces {
            faces: mesh.faces(),
        }
    }
}
