//! The [Cook–Torrance][0] specular term used for direct lighting on
//! reflective materials.
//!
//! [0]: https://en.wikipedia.org/wiki/Specular_highlight#Cook%E2%80%93Torrance_model

use geom::Vec3;

use crate::Spectrum;

/// Roughness is clamped to this floor so that perfectly smooth surfaces do
/// not degenerate the distribution.
pub const MIN_ROUGHNESS: f64 = 1e-4;

const EPS: f64 = 1e-9;

/// [Beckmann][0] normal distribution for the half-vector `h` against the
/// macro normal `n`, with roughness `m`. Zero on the lower hemisphere.
///
/// [0]: https://en.wikipedia.org/wiki/Specular_highlight#Beckmann_distribution
pub fn beckmann(h: Vec3, n: Vec3, m: f64) -> f64 {
    let cos = n.dot(&h);
    if cos <= 0.0 {
        return 0.0;
    }

    let c2 = cos * cos;

    ((c2 - 1.0) / (m * m * c2)).exp() / (std::f64::consts::PI * m * m * c2 * c2)
}

/// Smith geometric attenuation with the Beckmann rational approximation,
/// the product of the masking terms of both directions.
pub fn smith(wo: Vec3, wi: Vec3, n: Vec3, m: f64) -> f64 {
    smith_g1(wo, n, m) * smith_g1(wi, n, m)
}

fn smith_g1(w: Vec3, n: Vec3, m: f64) -> f64 {
    let cos = n.dot(&w);
    if cos <= 0.0 {
        return 0.0;
    }

    let tan = (1.0 - cos * cos).max(0.0).sqrt() / cos;
    if tan == 0.0 {
        return 1.0;
    }

    let a = 1.0 / (m * tan);
    if a >= 1.6 {
        return 1.0;
    }

    (3.535 * a + 2.181 * a * a) / (1.0 + 2.276 * a + 2.577 * a * a)
}

/// [Schlick's approximation][0] of Fresnel reflectance at the given cosine
/// of incidence.
///
/// [0]: https://en.wikipedia.org/wiki/Schlick%27s_approximation
pub fn schlick(cos: f64, f0: Spectrum) -> Spectrum {
    let c = (1.0 - cos).clamp(0.0, 1.0).powi(5);

    f0 + Spectrum::new((1.0 - f0.r) * c, (1.0 - f0.g) * c, (1.0 - f0.b) * c)
}

/// Scalar Schlick reflectance between two refraction indices, used by
/// dielectrics to split rays between reflection and transmission.
pub fn schlick_reflectance(cos: f64, n1: f64, n2: f64) -> f64 {
    let r0 = ((n1 - n2) / (n1 + n2)).powi(2);

    r0 + (1.0 - r0) * (1.0 - cos).clamp(0.0, 1.0).powi(5)
}

/// The full Cook–Torrance specular term `F·D·G / (4 (n·wo)(n·wi))`, with
/// `wo` pointing to the viewer and `wi` to the light.
pub fn specular(wo: Vec3, wi: Vec3, n: Vec3, roughness: f64, f0: Spectrum) -> Spectrum {
    let m = roughness.max(MIN_ROUGHNESS);

    let h = (wo + wi).normalized();

    let d = beckmann(h, n, m);
    let g = smith(wo, wi, n, m);
    let f = schlick(wo.dot(&h).max(0.0), f0);

    f * (d * g / (4.0 * n.dot(&wo).max(0.0) * n.dot(&wi).max(0.0) + EPS))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use geom::sample;

    use super::*;

    fn hemisphere_dir(n: Vec3, rng: &mut XorShiftRng) -> Vec3 {
        loop {
            let d = sample::unit_vector(rng);
            if d.dot(&n) > 1e-3 {
                return d;
            }
        }
    }

    #[test]
    fn test_beckmann_lower_hemisphere_is_zero() {
        let n = Vec3::new(0.0, 0.0, 1.0);

        assert_eq!(beckmann(Vec3::new(0.0, 0.0, -1.0), n, 0.3), 0.0);
        assert!(beckmann(n, n, 0.3) > 0.0);
    }

    #[test]
    fn test_smith_in_unit_range() {
        let mut rng = XorShiftRng::seed_from_u64(1);
        let n = Vec3::new(0.0, 0.0, 1.0);

        for _ in 0..500 {
            let wo = hemisphere_dir(n, &mut rng);
            let wi = hemisphere_dir(n, &mut rng);

            let g = smith(wo, wi, n, 0.4);
            assert!((0.0..=1.0).contains(&g));
        }
    }

    #[test]
    fn test_schlick_limits() {
        let f0 = Spectrum::new(0.9, 0.7, 0.4);

        assert_eq!(schlick(1.0, f0), f0);

        let grazing = schlick(0.0, f0);
        assert!((grazing.r - 1.0).abs() < 1e-12);
        assert!((grazing.g - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_specular_symmetric_and_non_negative() {
        let mut rng = XorShiftRng::seed_from_u64(2);
        let n = Vec3::new(0.0, 0.0, 1.0);
        let f0 = Spectrum::new(0.95, 0.64, 0.54);

        for _ in 0..500 {
            let wo = hemisphere_dir(n, &mut rng);
            let wi = hemisphere_dir(n, &mut rng);

            let a = specular(wo, wi, n, 0.3, f0);
            let b = specular(wi, wo, n, 0.3, f0);

            assert!(a.r >= 0.0 && a.g >= 0.0 && a.b >= 0.0);
            assert!((a.r - b.r).abs() < 1e-9 * a.r.abs().max(1.0));
            assert!((a.g - b.g).abs() < 1e-9 * a.g.abs().max(1.0));
            assert!((a.b - b.b).abs() < 1e-9 * a.b.abs().max(1.0));
        }
    }

    #[test]
    fn test_specular_vanishes_below_the_surface() {
        let n = Vec3::new(0.0, 0.0, 1.0);
        let f0 = Spectrum::new(0.95, 0.64, 0.54);

        let wo = Vec3::new(0.3, 0.1, 0.9).normalized();
        let below = Vec3::new(0.2, 0.4, -0.6).normalized();

        let s = specular(wo, below, n, 0.3, f0);
        assert_eq!(s, Spectrum::black());
    }

    #[test]
    fn test_schlick_reflectance() {
        // normal incidence on glass reflects about 4%
        let r = schlick_reflectance(1.0, 1.0, 1.5);
        assert!((r - 0.04).abs() < 1e-9);

        // grazing incidence reflects everything
        assert!((schlick_reflectance(0.0, 1.0, 1.5) - 1.0).abs() < 1e-12);
    }
}
