//! Minimal Wavefront OBJ reading, just enough to feed meshes: vertices,
//! texture coordinates and faces. Faces with more than three corners are fan
//! triangulated.

use std::io::BufRead;

use geom::{Point2, Point3};

use crate::{
    error::{Error, Result},
    shape::{Face, Mesh, Vertex},
};

/// Load the faces of an OBJ document from the given reader.
pub fn load_faces(r: impl BufRead) -> Result<Vec<Face>> {
    let mut positions: Vec<Point3> = vec![];
    let mut texcoords: Vec<Point2> = vec![];
    let mut faces: Vec<Face> = vec![];

    for line in r.lines() {
        let line = line?;

        let mut tokens = line.split_whitespace();
        let id = match tokens.next() {
            Some(id) => id,
            None => continue,
        };

        match id {
            "#" => {}
            "v" => {
                let x = tokens.next().ok_or(Error::MeshFormat)?.parse()?;
                let y = tokens.next().ok_or(Error::MeshFormat)?.parse()?;
                let z = tokens.next().ok_or(Error::MeshFormat)?.parse()?;

                positions.push(Point3::new(x, y, z));
            }
            "vt" => {
                let u = tokens.next().ok_or(Error::MeshFormat)?.parse()?;
                let v = tokens.next().ok_or(Error::MeshFormat)?.parse()?;

                texcoords.push(Point2::new(u, v));
            }
            "f" => {
                let corners = tokens
                    .map(|t| parse_corner(t, &positions, &texcoords))
                    .collect::<Result<Vec<_>>>()?;

                if corners.len() < 3 {
                    return Err(Error::MeshFormat);
                }

                // fan triangulation from the first corner
                for i in 1..corners.len() - 1 {
                    faces.push(Face::new([corners[0], corners[i], corners[i + 1]]));
                }
            }
            // ignore what the renderer has no use for
            "vn" | "vp" | "s" | "g" | "o" | "usemtl" | "mtllib" => {}
            _ => return Err(Error::MeshFormat),
        }
    }

    Ok(faces)
}

/// Load an OBJ document straight into a `Mesh`.
pub fn load_mesh(r: impl BufRead) -> Result<Mesh> {
    Mesh::new(load_faces(r)?)
}

/// Load the OBJ document at `path` from an asset root into a `Mesh`.
pub fn load_mesh_from(root: &dyn crate::assets::AssetRoot, path: &str) -> Result<Mesh> {
    let reader = std::io::BufReader::new(root.open(path)?);

    load_mesh(reader)
}

/// Parse one `f` corner of the form `v`, `v/vt` or `v/vt/vn`, resolving
/// 1-based and negative indices.
fn parse_corner(token: &str, positions: &[Point3], texcoords: &[Point2]) -> Result<Vertex> {
    let mut parts = token.split('/');

    let vi: isize = parts.next().ok_or(Error::MeshFormat)?.parse()?;
    let position = *resolve(positions, vi)?;

    let uv = match parts.next() {
        Some("") | None => Point2::origin(),
        Some(t) => *resolve(texcoords, t.parse()?)?,
    };

    Ok(Vertex::new(position, uv))
}

fn resolve<T>(items: &[T], i: isize) -> Result<&T> {
    if i == 0 {
        return Err(Error::MeshFormat);
    }

    let index = if i > 0 {
        i as usize - 1
    } else {
        items
            .len()
            .checked_sub(i.unsigned_abs())
            .ok_or(Error::MeshFormat)?
    };

    items.get(index).ok_or(Error::MeshFormat)
}
