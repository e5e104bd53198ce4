mod integrator;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use log::info;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    Scene, Spectrum,
};

/// Edge of the square tiles the image is partitioned into.
const TILE_SIZE: u32 = 16;

/// Parameters controlling a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Base seed every per-row RNG derives from.
    pub seed: i64,

    /// How many samples to take for each pixel. A single ray samples the
    /// pixel center, more rays jitter uniformly over the pixel footprint.
    pub rays_per_pixel: u32,

    /// Bounce budget: rays deeper than this contribute nothing.
    pub max_ray_depth: u32,

    /// Output image width and height in pixels.
    pub dx: u32,
    pub dy: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            seed: 0,
            rays_per_pixel: 1,
            max_ray_depth: 5,
            dx: 64,
            dy: 64,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<()> {
        if self.seed < 0 {
            return Err(Error::validation("seed must be non-negative"));
        }

        if self.rays_per_pixel == 0 {
            return Err(Error::validation("rays per pixel must be positive"));
        }

        if self.max_ray_depth == 0 {
            return Err(Error::validation("max ray depth must be positive"));
        }

        if self.dx == 0 || self.dy == 0 {
            return Err(Error::validation("image dimensions must be positive"));
        }

        Ok(())
    }
}

/// A handle the caller keeps to abort a running render. Cloned handles share
/// the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    /// Ask every worker to stop. Workers notice at tile and row boundaries.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters the workers bump while tracing.
#[derive(Debug, Default)]
pub(crate) struct AtomicStats {
    total_rays: AtomicU64,
    rays_exceeded_depth: AtomicU64,
    rays_left_scene: AtomicU64,
    invalid_rays: AtomicU64,
}

impl AtomicStats {
    pub(crate) fn count_ray(&self) {
        self.total_rays.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_exceeded_depth(&self) {
        self.rays_exceeded_depth.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_left_scene(&self) {
        self.rays_left_scene.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_invalid(&self) {
        self.invalid_rays.fetch_add(1, Ordering::Relaxed);
    }
}

/// What happened during a render.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub total_rays: u64,
    pub rays_exceeded_depth: u64,
    pub rays_left_scene: u64,
    pub invalid_rays: u64,
    pub elapsed: Duration,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "rendered {}x{} in {:.3?}", self.width, self.height, self.elapsed)?;
        writeln!(f, "  rays traced:    {}", self.total_rays)?;
        writeln!(f, "  exceeded depth: {}", self.rays_exceeded_depth)?;
        writeln!(f, "  left the scene: {}", self.rays_left_scene)?;
        write!(f, "  invalid:        {}", self.invalid_rays)
    }
}

/// The product of a render: the image plus its stats.
#[derive(Debug)]
pub struct Artifact {
    pub image: RgbaImage,
    pub stats: Stats,
}

/// A rectangular region of the image rendered as a unit of work. Bounds are
/// half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tile {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

/// Partition the image into `TILE_SIZE`² tiles, row-major, the last row and
/// column clipped to the image bounds.
fn tiles(width: u32, height: u32) -> Vec<Tile> {
    let mut tiles = vec![];

    let mut y0 = 0;
    while y0 < height {
        let y1 = (y0 + TILE_SIZE).min(height);

        let mut x0 = 0;
        while x0 < width {
            let x1 = (x0 + TILE_SIZE).min(width);
            tiles.push(Tile { x0, x1, y0, y1 });
            x0 = x1;
        }

        y0 = y1;
    }

    tiles
}

/// Render a `Scene` into an RGBA image.
///
/// The scene is validated first and rendering never starts on an invalid
/// scene.
pub fn render(scene: &Scene) -> Result<Artifact> {
    render_with_cancel(scene, &CancelFlag::new())
}

/// Render a `Scene`, checking `cancel` at tile and row boundaries. On
/// cancellation the partial image is discarded and `Error::Cancelled` is
/// returned.
pub fn render_with_cancel(scene: &Scene, cancel: &CancelFlag) -> Result<Artifact> {
    scene.validate()?;

    let opts = &scene.render_options;
    let (width, height) = (opts.dx, opts.dy);

    info!(
        "rendering {}x{} at {} rays/pixel, depth {}",
        width, height, opts.rays_per_pixel, opts.max_ray_depth
    );

    let start = Instant::now();
    let stats = AtomicStats::default();

    let rendered: Vec<(Tile, Vec<[u8; 4]>)> = tiles(width, height)
        .into_par_iter()
        .filter_map(|tile| {
            if cancel.is_cancelled() {
                return None;
            }

            Some((tile, render_tile(scene, tile, &stats, cancel)))
        })
        .collect();

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut image = RgbaImage::new(width, height);
    for (tile, pixels) in rendered {
        let mut i = 0;
        for y in tile.y0..tile.y1 {
            for x in tile.x0..tile.x1 {
                image.put_pixel(x, y, image::Rgba(pixels[i]));
                i += 1;
            }
        }
    }

    let stats = Stats {
        total_rays: stats.total_rays.into_inner(),
        rays_exceeded_depth: stats.rays_exceeded_depth.into_inner(),
        rays_left_scene: stats.rays_left_scene.into_inner(),
        invalid_rays: stats.invalid_rays.into_inner(),
        elapsed: start.elapsed(),
        width,
        height,
    };

    info!("render done: {} rays in {:.3?}", stats.total_rays, stats.elapsed);

    Ok(Artifact { image, stats })
}

/// Render one tile into a scanline-ordered pixel buffer.
///
/// Each row runs on a fresh RNG seeded from the configured seed, the row and
/// the tile column, which makes the output independent of how tiles are
/// scheduled across workers.
fn render_tile(scene: &Scene, tile: Tile, stats: &AtomicStats, cancel: &CancelFlag) -> Vec<[u8; 4]> {
    let opts = &scene.render_options;
    let (width, height) = (opts.dx, opts.dy);

    let mut pixels =
        Vec::with_capacity(((tile.x1 - tile.x0) * (tile.y1 - tile.y0)) as usize);

    for y in tile.y0..tile.y1 {
        if cancel.is_cancelled() {
            break;
        }

        let row_seed = (opts.seed as u64)
            .wrapping_add(u64::from(y) * u64::from(width))
            .wrapping_add(u64::from(tile.x0));
        let mut rng = XorShiftRng::seed_from_u64(row_seed);

        for x in tile.x0..tile.x1 {
            let mut total = Spectrum::black();

            for _ in 0..opts.rays_per_pixel {
                let (jx, jy) = if opts.rays_per_pixel == 1 {
                    (0.5, 0.5)
                } else {
                    (rng.gen(), rng.gen())
                };

                let s = (f64::from(x) + jx) / f64::from(width);
                // the image counts rows from the top, (s, t) from the bottom
                let t = 1.0 - (f64::from(y) + jy) / f64::from(height);

                let mut ray = scene.camera().cast(s, t, &mut rng);
                ray.pixel_x = x;
                ray.pixel_y = y;

                total += integrator::trace(scene, &ray, stats, &mut rng);
            }

            let [r, g, b] = (total / f64::from(opts.rays_per_pixel)).to_bytes();
            pixels.push([r, g, b, 255]);
        }
    }

    pixels
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use geom::{Distance, Point3, Vec3};

    use crate::camera::Orthographic;
    use crate::shape::{Quad, Sphere};
    use crate::texture::{ImageTexture, Interpolation, Wrap};
    use crate::{Camera, Light, Material, Node, Shape, Spectrum, Texture};

    use super::*;

    fn ortho_camera(fov: f64) -> Camera {
        Camera::Orthographic(Orthographic {
            look_from: Point3::new(0.0, 0.0, 5.0),
            look_at: Point3::origin(),
            vup: Vec3::new(0.0, 1.0, 0.0),
            fov_width: Distance::nm(fov),
            fov_height: Distance::nm(fov),
        })
    }

    fn options() -> RenderOptions {
        RenderOptions {
            seed: 0,
            rays_per_pixel: 1,
            max_ray_depth: 5,
            dx: 64,
            dy: 64,
        }
    }

    fn pixel(artifact: &Artifact, x: u32, y: u32) -> [u8; 4] {
        artifact.image.get_pixel(x, y).0
    }

    #[test]
    fn test_tiles_cover_the_image() {
        let ts = tiles(40, 33);

        assert_eq!(ts.len(), 3 * 3);
        assert_eq!(ts[0], Tile { x0: 0, x1: 16, y0: 0, y1: 16 });
        // the last column and row clip to the image
        assert_eq!(ts[2], Tile { x0: 32, x1: 40, y0: 0, y1: 16 });
        assert_eq!(ts[8], Tile { x0: 32, x1: 40, y0: 32, y1: 33 });

        let area: u32 = ts.iter().map(|t| (t.x1 - t.x0) * (t.y1 - t.y0)).sum();
        assert_eq!(area, 40 * 33);
    }

    #[test]
    fn test_red_sphere_under_a_light() {
        // a red diffuse sphere lit from above and towards the camera
        let scene = Scene::new(
            vec![ortho_camera(4.0)],
            vec![Node::new(
                "sphere",
                Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(1.0))),
                Material::lambertian(Texture::uniform(Spectrum::new(1.0, 0.0, 0.0))),
            )],
            vec![Light::point(
                Point3::new(0.0, 8.0, 8.0),
                Vec3::new(5.0, 5.0, 5.0),
            )],
            options(),
        );

        let artifact = render(&scene).unwrap();

        let [r, g, b, a] = pixel(&artifact, 32, 32);
        assert!(r > 0, "center pixel should catch direct red light");
        assert!(g < 10 && b < 10);
        assert_eq!(a, 255);

        // corner rays miss the sphere entirely
        assert_eq!(pixel(&artifact, 0, 0), [0, 0, 0, 255]);
        assert_eq!(pixel(&artifact, 63, 63), [0, 0, 0, 255]);

        assert!(artifact.stats.rays_left_scene > 0);
        assert!(artifact.stats.total_rays >= 64 * 64);
    }

    #[test]
    fn test_dielectric_in_an_emitting_skybox() {
        let scene = Scene::new(
            vec![ortho_camera(1.0)],
            vec![
                Node::new(
                    "glass",
                    Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(1.0))),
                    Material::dielectric(1.5, 0.0),
                ),
                Node::new(
                    "sky",
                    Shape::Sphere(Sphere::new(Point3::origin(), Distance::m(1.0))),
                    Material::emitter(Texture::uniform(Spectrum::new(0.5, 0.5, 0.5))),
                ),
            ],
            vec![],
            options(),
        );

        let artifact = render(&scene).unwrap();

        let [r, g, b, _] = pixel(&artifact, 32, 32);
        assert!(r > 0 && g > 0 && b > 0, "transmitted rays must reach the sky");

        // the glass splits rays, so strictly more rays than pixels
        assert!(artifact.stats.total_rays > 64 * 64);
    }

    #[test]
    fn test_checkerboard_quad_from_above() {
        // a checkered ground plane lit from very far above: the cosine term
        // is flat across the image so exactly two colors survive tone
        // mapping
        let scene = Scene::new(
            vec![Camera::Orthographic(Orthographic {
                look_from: Point3::new(0.0, 5.0, 0.0),
                look_at: Point3::origin(),
                vup: Vec3::new(0.0, 0.0, 1.0),
                fov_width: Distance::nm(8.0),
                fov_height: Distance::nm(8.0),
            })],
            vec![Node::new(
                "ground",
                Shape::Quad(Quad::new(
                    Point3::origin(),
                    Vec3::new(0.0, 1.0, 0.0),
                    Distance::nm(10.0),
                    Distance::nm(10.0),
                )),
                Material::lambertian(Texture::checkerboard(
                    Texture::uniform(Spectrum::white()),
                    Texture::uniform(Spectrum::black()),
                    5.0,
                )),
            )],
            vec![Light::point(
                Point3::new(0.0, 1e9, 0.0),
                Vec3::new(1.0, 1.0, 1.0),
            )],
            options(),
        );

        let artifact = render(&scene).unwrap();

        let mut colors: Vec<[u8; 4]> = artifact
            .image
            .pixels()
            .map(|p| p.0)
            .collect();
        colors.sort();
        colors.dedup();

        assert_eq!(
            colors.len(),
            2,
            "expected exactly two color clusters, got {:?}",
            colors
        );
    }

    #[test]
    fn test_debug_normal_sphere() {
        let scene = Scene::new(
            vec![ortho_camera(0.5)],
            vec![Node::new(
                "sphere",
                Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(1.0))),
                Material::DebugNormal,
            )],
            vec![],
            options(),
        );

        let artifact = render(&scene).unwrap();

        // the near pole faces +Z, so the center pixel paints (0.5, 0.5, 1)
        let [r, g, b, _] = pixel(&artifact, 32, 32);
        assert!((127..=129).contains(&r), "r = {}", r);
        assert!((127..=129).contains(&g), "g = {}", g);
        assert!((254..=255).contains(&b), "b = {}", b);
    }

    #[test]
    fn test_green_emitter_quad() {
        let mut raster = image::RgbImage::new(4, 4);
        for p in raster.pixels_mut() {
            *p = image::Rgb([0, 255, 0]);
        }

        let scene = Scene::new(
            vec![ortho_camera(2.0)],
            vec![Node::new(
                "panel",
                Shape::Quad(Quad::new(
                    Point3::origin(),
                    Vec3::new(0.0, 0.0, 1.0),
                    Distance::nm(4.0),
                    Distance::nm(4.0),
                )),
                Material::emitter(Arc::new(Texture::Image(ImageTexture::from_raster(
                    raster,
                    Interpolation::Nearest,
                    Wrap::Clamp,
                )))),
            )],
            vec![],
            options(),
        );

        let artifact = render(&scene).unwrap();

        // the quad covers the whole image at this FOV
        for (_, _, p) in artifact.image.enumerate_pixels() {
            let [r, g, b, _] = p.0;
            assert!(g >= 250, "g = {}", g);
            assert!(r <= 10 && b <= 10);
        }
    }

    #[test]
    fn test_mirrors_exhaust_the_depth_budget() {
        // two facing mirrors bounce rays until the depth budget runs out
        let scene = Scene::new(
            vec![ortho_camera(2.0)],
            vec![
                Node::new(
                    "far",
                    Shape::Quad(Quad::new(
                        Point3::new(0.0, 0.0, -2.0),
                        Vec3::new(0.0, 0.0, 1.0),
                        Distance::nm(50.0),
                        Distance::nm(50.0),
                    )),
                    Material::metal(Spectrum::white(), 0.0),
                ),
                Node::new(
                    "near",
                    Shape::Quad(Quad::new(
                        Point3::new(0.0, 0.0, 8.0),
                        Vec3::new(0.0, 0.0, -1.0),
                        Distance::nm(50.0),
                        Distance::nm(50.0),
                    )),
                    Material::metal(Spectrum::white(), 0.0),
                ),
            ],
            vec![],
            options(),
        );

        let artifact = render(&scene).unwrap();

        assert!(artifact.stats.rays_exceeded_depth > 0);
        assert_eq!(pixel(&artifact, 32, 32), [0, 0, 0, 255]);
    }

    #[test]
    fn test_deterministic_across_runs_and_workers() {
        let scene = Scene::new(
            vec![ortho_camera(4.0)],
            vec![Node::new(
                "sphere",
                Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(1.0))),
                Material::lambertian(Texture::uniform(Spectrum::new(0.8, 0.4, 0.2))),
            )],
            vec![Light::point(
                Point3::new(3.0, 8.0, 8.0),
                Vec3::new(4.0, 4.0, 4.0),
            )],
            RenderOptions {
                rays_per_pixel: 4,
                ..options()
            },
        );

        let a = render(&scene).unwrap();
        let b = render(&scene).unwrap();
        assert_eq!(a.image.as_raw(), b.image.as_raw());

        // a single-threaded pool must produce the very same bytes
        let single = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| render(&scene).unwrap());

        assert_eq!(a.image.as_raw(), single.image.as_raw());
    }

    #[test]
    fn test_cancellation() {
        let scene = Scene::new(
            vec![ortho_camera(4.0)],
            vec![Node::new(
                "sphere",
                Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(1.0))),
                Material::lambertian(Texture::uniform(Spectrum::white())),
            )],
            vec![],
            options(),
        );

        let cancel = CancelFlag::new();
        cancel.cancel();

        match render_with_cancel(&scene, &cancel) {
            Err(Error::Cancelled) => {}
            other => panic!("expected cancellation, got {:?}", other.map(|a| a.stats)),
        }
    }

    #[test]
    fn test_invalid_scene_never_renders() {
        let scene = Scene::new(vec![], vec![], vec![], options());

        assert!(matches!(render(&scene), Err(Error::Validation(_))));
    }

    #[test]
    fn test_json_round_trip_renders_identically() {
        let scene = Scene::new(
            vec![ortho_camera(4.0)],
            vec![Node::new(
                "sphere",
                Shape::Sphere(Sphere::new(Point3::origin(), Distance::nm(1.0))),
                Material::lambertian(Texture::uniform(Spectrum::new(1.0, 0.2, 0.1))),
            )],
            vec![Light::point(
                Point3::new(0.0, 8.0, 8.0),
                Vec3::new(5.0, 5.0, 5.0),
            )],
            RenderOptions {
                dx: 32,
                dy: 32,
                ..options()
            },
        );

        let decoded = Scene::from_json(&scene.to_json().unwrap()).unwrap();

        let a = render(&scene).unwrap();
        let b = render(&decoded).unwrap();

        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }
}
