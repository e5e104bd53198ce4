use geom::{Distance, Point3, Vec3};

use lumen::camera::Focusable;
use lumen::shape::{Quad, Sphere};
use lumen::{render, Camera, Light, Material, Node, RenderOptions, Scene, Shape, Spectrum, Texture};

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let checker = Texture::checkerboard(
        Texture::uniform(Spectrum::new(0.9, 0.9, 0.9)),
        Texture::uniform(Spectrum::new(0.2, 0.2, 0.2)),
        40.0,
    );

    let scene = Scene::new(
        vec![Camera::Focusable(Focusable {
            look_from: Point3::new(0.0, 4.0, 10.0),
            look_at: Point3::new(0.0, 1.0, 0.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            fov_width: 0.9,
            fov_height: 0.9,
            aperture: Distance::nm(0.15),
            working_distance: Distance::nm(10.0),
        })],
        vec![
            Node::new(
                "ground",
                Shape::Quad(Quad::new(
                    Point3::origin(),
                    Vec3::new(0.0, 1.0, 0.0),
                    Distance::nm(40.0),
                    Distance::nm(40.0),
                )),
                Material::lambertian(checker),
            ),
            Node::new(
                "porcelain",
                Shape::Sphere(Sphere::new(Point3::new(-2.2, 1.0, 0.0), Distance::nm(1.0))),
                Material::lambertian(Texture::uniform(Spectrum::new(0.9, 0.4, 0.35))),
            ),
            Node::new(
                "chrome",
                Shape::Sphere(Sphere::new(Point3::new(0.0, 1.0, 0.0), Distance::nm(1.0))),
                Material::metal(Spectrum::new(0.9, 0.9, 0.95), 0.05),
            ),
            Node::new(
                "glass",
                Shape::Sphere(Sphere::new(Point3::new(2.2, 1.0, 0.0), Distance::nm(1.0))),
                Material::dielectric(1.5, 0.0),
            ),
            Node::new(
                "sky",
                Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(500.0))),
                Material::emitter(Texture::uniform(Spectrum::new(0.6, 0.7, 0.8))),
            ),
        ],
        vec![Light::point(
            Point3::new(5.0, 12.0, 8.0),
            Vec3::new(0.8, 0.8, 0.75),
        )],
        RenderOptions {
            seed: 0,
            rays_per_pixel: 64,
            max_ray_depth: 6,
            dx: 800,
            dy: 600,
        },
    );

    let artifact = render(&scene)?;
    println!("{}", artifact.stats);

    artifact.image.save("still_life.png")?;

    Ok(())
}
