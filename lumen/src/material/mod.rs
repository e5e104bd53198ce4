pub mod microfacet;

use std::sync::Arc;

use rand::Rng;

use serde::{Deserialize, Serialize};

use geom::{sample, Vec3};

use crate::{
    error::{Error, Result},
    scene::Scene,
    shape::SurfaceHit,
    Ray, Spectrum, Texture,
};

/// Offset along the normal applied to secondary ray origins so they do not
/// immediately re-hit the surface they left.
const SURFACE_EPSILON: f64 = 1e-6;

/// Everything a material needs to know about a ray hitting a surface.
#[derive(Debug, Clone)]
pub struct SurfaceInteraction {
    /// The ray that hit the surface.
    pub incoming: Ray,

    /// Unit direction towards the viewer, the reverse of the incoming
    /// direction.
    pub outgoing: Vec3,

    pub hit: SurfaceHit,

    /// Index of the scene node that was hit.
    pub node: usize,
}

/// What a ray becomes after hitting a surface: zero or more scattered rays
/// plus any radiance emitted at the hit.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub scattered: Vec<Ray>,
    pub emission: Spectrum,
}

impl Resolution {
    fn absorbed() -> Self {
        Resolution {
            scattered: vec![],
            emission: Spectrum::black(),
        }
    }

    fn emitting(emission: Spectrum) -> Self {
        Resolution {
            scattered: vec![],
            emission,
        }
    }

    fn scattering(scattered: Vec<Ray>) -> Self {
        Resolution {
            scattered,
            emission: Spectrum::black(),
        }
    }
}

/// How a surface responds to light.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Data")]
pub enum Material {
    /// A diffuse surface scattering over the cosine-weighted hemisphere.
    Lambertian { albedo: Arc<Texture> },

    /// A mirror-like surface, optionally fuzzed.
    Metal { albedo: Spectrum, fuzz: f64 },

    /// A transparent surface splitting rays between reflection and
    /// refraction.
    Dielectric {
        refraction_index: f64,
        roughness: f64,
    },

    /// A surface that emits and never scatters.
    Emitter { texture: Arc<Texture> },

    /// Paints the world-space normal, for debugging geometry.
    DebugNormal,

    /// Paints the surface UVs, for debugging parameterizations.
    DebugUv,
}

impl Material {
    pub fn lambertian(albedo: Arc<Texture>) -> Self {
        Material::Lambertian { albedo }
    }

    pub fn metal(albedo: Spectrum, fuzz: f64) -> Self {
        Material::Metal { albedo, fuzz }
    }

    pub fn dielectric(refraction_index: f64, roughness: f64) -> Self {
        Material::Dielectric {
            refraction_index,
            roughness,
        }
    }

    pub fn emitter(texture: Arc<Texture>) -> Self {
        Material::Emitter { texture }
    }

    /// What does this ray become after hitting the surface?
    pub fn resolve(&self, si: &SurfaceInteraction, rng: &mut impl Rng) -> Resolution {
        match self {
            Material::Lambertian { albedo } => {
                let albedo = albedo.sample(si.hit.uv.x, si.hit.uv.y);

                let dir = sample::cosine_weighted_hemisphere(si.hit.normal, rng);
                let origin = si.hit.point + si.hit.normal * SURFACE_EPSILON;

                Resolution::scattering(vec![si.incoming.bounce(
                    origin,
                    dir,
                    si.incoming.throughput * albedo,
                )])
            }

            Material::Metal { albedo, fuzz } => {
                let d = si.incoming.dir.normalized();
                let reflected = d - si.hit.normal * (2.0 * d.dot(&si.hit.normal));

                let dir = reflected + sample::in_unit_sphere(rng) * *fuzz;

                // a perturbed reflection diving below the surface is absorbed
                if dir.dot(&si.hit.normal) <= 0.0 {
                    return Resolution::absorbed();
                }

                let origin = si.hit.point + si.hit.normal * SURFACE_EPSILON;

                Resolution::scattering(vec![si.incoming.bounce(
                    origin,
                    dir.normalized(),
                    si.incoming.throughput * *albedo,
                )])
            }

            Material::Dielectric {
                refraction_index,
                roughness,
            } => self.resolve_dielectric(si, *refraction_index, *roughness, rng),

            Material::Emitter { texture } => Resolution::emitting(
                texture.sample(si.hit.uv.x, si.hit.uv.y) * si.incoming.throughput,
            ),

            Material::DebugNormal => {
                let n = si.hit.normal;

                Resolution::emitting(
                    Spectrum::new((n.x + 1.0) / 2.0, (n.y + 1.0) / 2.0, (n.z + 1.0) / 2.0)
                        .clamp(0.0, 1.0),
                )
            }

            Material::DebugUv => {
                let uv = si.hit.uv;

                // a U outside [0, 1] is a parameterization bug, paint it red
                if !(0.0..=1.0).contains(&uv.x) {
                    return Resolution::emitting(Spectrum::new(1.0, 0.0, 0.0));
                }

                Resolution::emitting(Spectrum::new(uv.x, uv.y, 0.5).clamp(0.0, 1.0))
            }
        }
    }

    fn resolve_dielectric(
        &self,
        si: &SurfaceInteraction,
        refraction_index: f64,
        roughness: f64,
        rng: &mut impl Rng,
    ) -> Resolution {
        let d = si.incoming.dir.normalized();

        // entering or exiting? swap the indices and flip the normal to match
        let (n1, n2, normal) = if d.dot(&si.hit.normal) < 0.0 {
            (1.0, refraction_index, si.hit.normal)
        } else {
            (refraction_index, 1.0, -si.hit.normal)
        };

        let cos = -d.dot(&normal);

        let eta = n1 / n2;
        let sin2_t = eta * eta * (1.0 - cos * cos);

        let refracted = if sin2_t <= 1.0 {
            // Snell's law
            Some(d * eta + normal * (eta * cos - (1.0 - sin2_t).sqrt()))
        } else {
            // total internal reflection
            None
        };

        let reflect_prob = if refracted.is_some() {
            microfacet::schlick_reflectance(cos, n1, n2)
        } else {
            1.0
        };

        fn perturb(dir: Vec3, roughness: f64, rng: &mut impl Rng) -> Vec3 {
            if roughness > 0.0 {
                (dir + sample::in_unit_sphere(rng) * roughness).normalized()
            } else {
                dir
            }
        }

        let mut scattered = vec![];

        if let Some(refracted) = refracted {
            if reflect_prob < 1.0 {
                scattered.push(si.incoming.bounce(
                    si.hit.point - normal * SURFACE_EPSILON,
                    perturb(refracted.normalized(), roughness, rng),
                    si.incoming.throughput * (1.0 - reflect_prob),
                ));
            }
        }

        if reflect_prob > 0.0 {
            let reflected = d - normal * (2.0 * d.dot(&normal));

            scattered.push(si.incoming.bounce(
                si.hit.point + normal * SURFACE_EPSILON,
                perturb(reflected.normalized(), roughness, rng),
                si.incoming.throughput * reflect_prob,
            ));
        }

        Resolution::scattering(scattered)
    }

    /// Next-event estimation: the radiance reaching this hit directly from
    /// the scene's lights.
    pub fn direct_lighting(
        &self,
        si: &SurfaceInteraction,
        scene: &Scene,
        rng: &mut impl Rng,
    ) -> Spectrum {
        match self {
            Material::Lambertian { albedo } => {
                let albedo = albedo.sample(si.hit.uv.x, si.hit.uv.y);

                self.gather_lights(si, scene, rng, |wi, intensity| {
                    let cos = si.hit.normal.dot(&wi).max(0.0);

                    albedo * Spectrum::from_vec3(intensity) * cos
                })
            }

            Material::Metal { albedo, fuzz } => {
                let f0 = *albedo;
                let m = *fuzz;

                self.gather_lights(si, scene, rng, |wi, intensity| {
                    let cos = si.hit.normal.dot(&wi).max(0.0);
                    let f = microfacet::specular(si.outgoing, wi, si.hit.normal, m, f0);

                    f * Spectrum::from_vec3(intensity) * cos
                })
            }

            Material::Dielectric {
                refraction_index,
                roughness,
            } => {
                let r0 = ((1.0 - refraction_index) / (1.0 + refraction_index)).powi(2);
                let f0 = Spectrum::new(r0, r0, r0);
                let m = *roughness;

                self.gather_lights(si, scene, rng, |wi, intensity| {
                    let cos = si.hit.normal.dot(&wi).max(0.0);
                    let f = microfacet::specular(si.outgoing, wi, si.hit.normal, m, f0);

                    f * Spectrum::from_vec3(intensity) * cos
                })
            }

            Material::Emitter { .. } | Material::DebugNormal | Material::DebugUv => {
                Spectrum::black()
            }
        }
    }

    /// Sum the contribution of every unoccluded light through `shade`.
    fn gather_lights(
        &self,
        si: &SurfaceInteraction,
        scene: &Scene,
        rng: &mut impl Rng,
        shade: impl Fn(Vec3, Vec3) -> Spectrum,
    ) -> Spectrum {
        let origin = si.hit.point + si.hit.normal * SURFACE_EPSILON;

        let mut total = Spectrum::black();

        for light in &scene.lights {
            let (wi, distance, intensity) = light.sample(si.hit.point, rng);

            if si.hit.normal.dot(&wi) <= 0.0 {
                continue;
            }

            if scene.occluded(origin, wi, distance, si.node) {
                continue;
            }

            total += shade(wi, intensity);
        }

        total
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Material::Lambertian { albedo } => albedo.validate(),
            Material::Metal { albedo, fuzz } => {
                if !albedo.is_finite() {
                    return Err(Error::validation("metal albedo is not finite"));
                }
                if !fuzz.is_finite() || *fuzz < 0.0 {
                    return Err(Error::validation("metal fuzz must be non-negative"));
                }
                Ok(())
            }
            Material::Dielectric {
                refraction_index,
                roughness,
            } => {
                if !refraction_index.is_finite() || *refraction_index < 1.0 {
                    return Err(Error::validation(
                        "dielectric refraction index must be at least 1",
                    ));
                }
                if !roughness.is_finite() || *roughness < 0.0 {
                    return Err(Error::validation(
                        "dielectric roughness must be non-negative",
                    ));
                }
                Ok(())
            }
            Material::Emitter { texture } => texture.validate(),
            Material::DebugNormal | Material::DebugUv => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use geom::{Distance, Point2, Point3};

    use crate::render::RenderOptions;
    use crate::shape::{Shape, Sphere, SurfaceHit};
    use crate::{Light, Node};

    use super::*;

    fn interaction() -> SurfaceInteraction {
        // a ray going straight down hitting an upward-facing surface
        let incoming = Ray::new(Point3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));

        SurfaceInteraction {
            outgoing: Vec3::new(0.0, 1.0, 0.0),
            incoming,
            hit: SurfaceHit {
                t: Distance::nm(5.0),
                point: Point3::origin(),
                normal: Vec3::new(0.0, 1.0, 0.0),
                uv: Point2::new(0.25, 0.75),
            },
            node: 0,
        }
    }

    fn glancing_interaction() -> SurfaceInteraction {
        // a ray grazing an upward-facing surface almost parallel to it
        let dir = Vec3::new(1.0, -0.01, 0.0).normalized();
        let incoming = Ray::new(Point3::new(-5.0, 0.05, 0.0), dir);

        SurfaceInteraction {
            outgoing: -dir,
            incoming,
            hit: SurfaceHit {
                t: Distance::nm(5.0),
                point: Point3::origin(),
                normal: Vec3::new(0.0, 1.0, 0.0),
                uv: Point2::new(0.5, 0.5),
            },
            node: 0,
        }
    }

    fn white() -> Arc<Texture> {
        Texture::uniform(Spectrum::white())
    }

    #[test]
    fn test_scattered_rays_go_one_level_deeper() {
        let mut rng = XorShiftRng::seed_from_u64(0);

        let mut si = interaction();
        si.incoming.depth = 3;

        let materials = [
            Material::lambertian(white()),
            Material::metal(Spectrum::white(), 0.0),
            Material::dielectric(1.5, 0.0),
        ];

        for m in materials {
            let r = m.resolve(&si, &mut rng);
            assert!(!r.scattered.is_empty(), "{:?} did not scatter", m);

            for s in &r.scattered {
                assert_eq!(s.depth, 4);
                assert_eq!((s.pixel_x, s.pixel_y), (0, 0));
            }
        }
    }

    #[test]
    fn test_lambertian_scatters_into_the_hemisphere() {
        let mut rng = XorShiftRng::seed_from_u64(1);

        let m = Material::lambertian(Texture::uniform(Spectrum::new(0.5, 0.25, 0.125)));
        let si = interaction();

        for _ in 0..100 {
            let r = m.resolve(&si, &mut rng);

            let s = &r.scattered[0];
            assert!(s.dir.dot(&si.hit.normal) >= 0.0);
            assert_eq!(s.throughput, Spectrum::new(0.5, 0.25, 0.125));
            assert_eq!(r.emission, Spectrum::black());
        }
    }

    #[test]
    fn test_metal_reflects_and_absorbs() {
        let mut rng = XorShiftRng::seed_from_u64(2);

        // a perfect mirror reflects deterministically
        let m = Material::metal(Spectrum::new(0.9, 0.9, 0.9), 0.0);
        let si = interaction();

        let r = m.resolve(&si, &mut rng);
        assert_eq!(r.scattered.len(), 1);
        assert!((r.scattered[0].dir - Vec3::new(0.0, 1.0, 0.0)).norm() < 1e-12);

        // heavy fuzz on a glancing hit dives below the surface sometimes
        let m = Material::metal(Spectrum::white(), 1.0);
        let si = glancing_interaction();

        let absorbed = (0..200)
            .filter(|_| m.resolve(&si, &mut rng).scattered.is_empty())
            .count();
        assert!(absorbed > 0);
    }

    #[test]
    fn test_dielectric_splits_reflection_and_refraction() {
        let mut rng = XorShiftRng::seed_from_u64(3);

        let m = Material::dielectric(1.5, 0.0);
        let si = interaction();

        let r = m.resolve(&si, &mut rng);
        assert_eq!(r.scattered.len(), 2);

        // the throughputs split the incoming energy
        let total: f64 = r.scattered.iter().map(|s| s.throughput.r).sum();
        assert!((total - 1.0).abs() < 1e-12);

        // the refracted ray continues downward, the reflected one goes back
        assert!(r.scattered.iter().any(|s| s.dir.y < 0.0));
        assert!(r.scattered.iter().any(|s| s.dir.y > 0.0));
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let mut rng = XorShiftRng::seed_from_u64(4);

        // grazing the interface from inside the glass: no refracted ray
        // survives
        let dir = Vec3::new(1.0, 0.2, 0.0).normalized();
        let incoming = Ray::new(Point3::new(-1.0, -0.2, 0.0), dir);

        let si = SurfaceInteraction {
            outgoing: -dir,
            incoming,
            hit: SurfaceHit {
                t: Distance::nm(1.0),
                point: Point3::origin(),
                normal: Vec3::new(0.0, 1.0, 0.0),
                uv: Point2::origin(),
            },
            node: 0,
        };

        let m = Material::dielectric(1.5, 0.0);
        let r = m.resolve(&si, &mut rng);

        assert_eq!(r.scattered.len(), 1);
        assert_eq!(r.scattered[0].throughput, Spectrum::white());
    }

    #[test]
    fn test_emitter_modulated_by_throughput() {
        let mut rng = XorShiftRng::seed_from_u64(5);

        let m = Material::emitter(Texture::uniform(Spectrum::new(0.0, 1.0, 0.0)));

        let mut si = interaction();
        si.incoming.throughput = Spectrum::new(0.5, 0.5, 0.5);

        let r = m.resolve(&si, &mut rng);
        assert!(r.scattered.is_empty());
        assert_eq!(r.emission, Spectrum::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_debug_materials() {
        let mut rng = XorShiftRng::seed_from_u64(6);

        let si = interaction();

        let r = Material::DebugNormal.resolve(&si, &mut rng);
        assert_eq!(r.emission, Spectrum::new(0.5, 1.0, 0.5));

        let r = Material::DebugUv.resolve(&si, &mut rng);
        assert_eq!(r.emission, Spectrum::new(0.25, 0.75, 0.5));

        // out-of-range U paints pure red
        let mut si = si;
        si.hit.uv = Point2::new(1.5, 0.5);
        let r = Material::DebugUv.resolve(&si, &mut rng);
        assert_eq!(r.emission, Spectrum::new(1.0, 0.0, 0.0));
    }

    fn lit_scene(blocked: bool) -> (Scene, SurfaceInteraction) {
        let mut nodes = vec![Node::new(
            "ground",
            Shape::Sphere(Sphere::new(Point3::new(0.0, -1.0, 0.0), Distance::nm(1.0))),
            Material::lambertian(white()),
        )];

        if blocked {
            nodes.push(Node::new(
                "blocker",
                Shape::Sphere(Sphere::new(Point3::new(0.0, 5.0, 0.0), Distance::nm(1.0))),
                Material::lambertian(white()),
            ));
        }

        let scene = Scene::new(
            vec![],
            nodes,
            vec![Light::point(
                Point3::new(0.0, 10.0, 0.0),
                Vec3::new(2.0, 2.0, 2.0),
            )],
            RenderOptions::default(),
        );

        (scene, interaction())
    }

    #[test]
    fn test_lambertian_direct_lighting() {
        let mut rng = XorShiftRng::seed_from_u64(7);

        let (scene, si) = lit_scene(false);
        let m = Material::lambertian(white());

        // the light is straight up: albedo · intensity · cos(0)
        let direct = m.direct_lighting(&si, &scene, &mut rng);
        assert!((direct.r - 2.0).abs() < 1e-9);

        let (scene, si) = lit_scene(true);
        let direct = m.direct_lighting(&si, &scene, &mut rng);
        assert_eq!(direct, Spectrum::black());
    }

    #[test]
    fn test_specular_direct_lighting_is_non_negative() {
        let mut rng = XorShiftRng::seed_from_u64(8);

        let (scene, _) = lit_scene(false);
        let si = glancing_interaction();

        for m in [
            Material::metal(Spectrum::new(0.95, 0.64, 0.54), 0.3),
            Material::dielectric(1.5, 0.2),
        ] {
            let direct = m.direct_lighting(&si, &scene, &mut rng);
            assert!(direct.r >= 0.0 && direct.g >= 0.0 && direct.b >= 0.0);
        }
    }

    #[test]
    fn test_validate() {
        assert!(Material::lambertian(white()).validate().is_ok());
        assert!(Material::metal(Spectrum::white(), -0.1).validate().is_err());
        assert!(Material::dielectric(0.5, 0.0).validate().is_err());
        assert!(Material::dielectric(1.5, -1.0).validate().is_err());
    }
}
