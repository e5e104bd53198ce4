use std::f64::consts::TAU;

use geom::{Distance, Point3, Vec3};

use lumen::camera::{Animated, Orthographic};
use lumen::shape::{Cylinder, Sphere};
use lumen::{render, Camera, Light, Material, Node, RenderOptions, Scene, Shape, Spectrum, Texture};

/// Render a few frames of a camera orbiting a small arrangement.
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let orbit = Animated::new(
        |u| {
            let angle = u * TAU;

            Camera::Orthographic(Orthographic {
                look_from: Point3::new(8.0 * angle.cos(), 4.0, 8.0 * angle.sin()),
                look_at: Point3::new(0.0, 1.0, 0.0),
                vup: Vec3::new(0.0, 1.0, 0.0),
                fov_width: Distance::nm(8.0),
                fov_height: Distance::nm(8.0),
            })
        },
        1.0,
    );

    let nodes = vec![
        Node::new(
            "pedestal",
            Shape::Cylinder(Cylinder::new(
                Point3::origin(),
                Vec3::new(0.0, 1.0, 0.0),
                Distance::nm(1.5),
                Distance::nm(0.5),
            )),
            Material::lambertian(Texture::uniform(Spectrum::new(0.6, 0.6, 0.65))),
        ),
        Node::new(
            "bauble",
            Shape::Sphere(Sphere::new(Point3::new(0.0, 1.5, 0.0), Distance::nm(1.0))),
            Material::metal(Spectrum::new(0.95, 0.7, 0.3), 0.1),
        ),
        Node::new(
            "sky",
            Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(200.0))),
            Material::emitter(Texture::uniform(Spectrum::new(0.5, 0.6, 0.7))),
        ),
    ];

    for frame in 0..8 {
        let u = f64::from(frame) / 8.0;

        let scene = Scene::new(
            vec![Camera::Animated(orbit.clone().with_u(u))],
            nodes.clone(),
            vec![Light::point(
                Point3::new(0.0, 10.0, 0.0),
                Vec3::new(0.7, 0.7, 0.7),
            )],
            RenderOptions {
                seed: 0,
                rays_per_pixel: 16,
                max_ray_depth: 5,
                dx: 320,
                dy: 240,
            },
        );

        let artifact = render(&scene)?;
        artifact.image.save(format!("turntable_{:02}.png", frame))?;

        println!("frame {}\n{}", frame, artifact.stats);
    }

    Ok(())
}
