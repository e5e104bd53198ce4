use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use geom::{Distance, Point3, Vec3};

use crate::{
    error::{Error, Result},
    render::RenderOptions,
    shape::T_MIN,
    Camera, Light, Material, Ray, Shape,
};

/// A named, materialized shape placed in a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub shape: Shape,
    pub material: Material,
}

impl Node {
    pub fn new(name: impl Into<String>, shape: Shape, material: Material) -> Self {
        Node {
            name: name.into(),
            shape,
            material,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("node name is empty"));
        }

        self.shape
            .validate()
            .map_err(|e| prefix(&self.name, e))?;
        self.material
            .validate()
            .map_err(|e| prefix(&self.name, e))
    }
}

fn prefix(name: &str, e: Error) -> Error {
    match e {
        Error::Validation(msg) => Error::Validation(format!("node {:?}: {}", name, msg)),
        e => e,
    }
}

/// Everything a render needs: cameras, nodes, lights and options.
///
/// The scene owns all of it exclusively and is immutable while a render is
/// running, so workers share it by plain reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// The first camera is the one used for rendering.
    pub cameras: Vec<Camera>,
    pub nodes: Vec<Node>,
    pub lights: Vec<Light>,
    pub render_options: RenderOptions,
}

impl Scene {
    pub fn new(
        cameras: Vec<Camera>,
        nodes: Vec<Node>,
        lights: Vec<Light>,
        render_options: RenderOptions,
    ) -> Self {
        Scene {
            cameras,
            nodes,
            lights,
            render_options,
        }
    }

    /// The camera used for rendering.
    ///
    /// Panics when the scene has no cameras, which `validate` rejects.
    pub fn camera(&self) -> &Camera {
        &self.cameras[0]
    }

    /// Check the whole scene before rendering: at least one camera, unique
    /// node names and every member valid.
    pub fn validate(&self) -> Result<()> {
        if self.cameras.is_empty() {
            return Err(Error::validation("scene has no cameras"));
        }

        for camera in &self.cameras {
            camera.validate()?;
        }

        let mut names = HashSet::new();
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate node name {:?}",
                    node.name
                )));
            }

            node.validate()?;
        }

        for light in &self.lights {
            light.validate()?;
        }

        self.render_options.validate()
    }

    /// Check whether anything blocks the segment from `origin` towards `dir`
    /// before `max_dist`, ignoring the node at index `skip`.
    pub fn occluded(&self, origin: Point3, dir: Vec3, max_dist: Distance, skip: usize) -> bool {
        let ray = Ray::new(origin, dir);

        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .any(|(_, node)| node.shape.collide(&ray, T_MIN, max_dist).is_some())
    }

    /// Encode the scene as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a scene from JSON. Unknown type discriminators fail.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::shape::Sphere;
    use crate::{Spectrum, Texture};

    use super::*;

    fn test_scene() -> Scene {
        let red = Texture::uniform(Spectrum::new(1.0, 0.0, 0.0));

        Scene::new(
            vec![Camera::Orthographic(crate::camera::Orthographic {
                look_from: Point3::new(0.0, 0.0, 5.0),
                look_at: Point3::origin(),
                vup: Vec3::new(0.0, 1.0, 0.0),
                fov_width: Distance::nm(4.0),
                fov_height: Distance::nm(4.0),
            })],
            vec![
                Node::new(
                    "ball",
                    Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(1.0))),
                    Material::lambertian(Arc::clone(&red)),
                ),
                Node::new(
                    "blocker",
                    Shape::Sphere(Sphere::new(Point3::new(0.0, 5.0, 0.0), Distance::nm(1.0))),
                    Material::lambertian(red),
                ),
            ],
            vec![Light::point(
                Point3::new(0.0, 10.0, 0.0),
                Vec3::new(5.0, 5.0, 5.0),
            )],
            RenderOptions::default(),
        )
    }

    #[test]
    fn test_validate() {
        assert!(test_scene().validate().is_ok());

        let mut scene = test_scene();
        scene.cameras.clear();
        assert!(scene.validate().is_err());

        let mut scene = test_scene();
        scene.nodes[1].name = "ball".into();
        assert!(scene.validate().is_err());

        let mut scene = test_scene();
        scene.nodes[0].shape =
            Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(-1.0)));
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_occluded() {
        let scene = test_scene();

        // the blocker sits between the ball and the light
        assert!(scene.occluded(
            Point3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Distance::nm(9.0),
            0,
        ));

        // looking away from the blocker
        assert!(!scene.occluded(
            Point3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Distance::nm(9.0),
            0,
        ));

        // occlusion beyond the light distance does not count
        assert!(!scene.occluded(
            Point3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Distance::nm(2.0),
            0,
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let scene = test_scene();

        let json = scene.to_json().unwrap();
        let decoded = Scene::from_json(&json).unwrap();

        assert!(decoded.validate().is_ok());
        assert_eq!(decoded.nodes.len(), scene.nodes.len());
        assert_eq!(decoded.nodes[0].name, "ball");

        // the discriminated-union wire shape
        assert!(json.contains("\"Type\": \"Sphere\""));
        assert!(json.contains("\"Type\": \"Lambertian\""));
    }

    #[test]
    fn test_unknown_discriminator_fails() {
        let scene = test_scene();
        let json = scene.to_json().unwrap().replace("\"Sphere\"", "\"Blob\"");

        assert!(Scene::from_json(&json).is_err());
    }
}
