use rand::Rng;

use serde::{Deserialize, Serialize};

use geom::{Distance, Point3, Vec3};

use crate::error::{Error, Result};

/// A light source the integrator can sample for next-event estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Data")]
pub enum Light {
    /// An infinitesimal emitter at a point in space.
    ///
    /// The radiant intensity is in W/sr and reaches a surface unattenuated:
    /// energy conservation comes from the cosine term and occlusion in the
    /// integrator, not from inverse-square falloff.
    Point {
        position: Point3,
        radiant_intensity: Vec3,
    },
}

impl Light {
    pub fn point(position: Point3, radiant_intensity: Vec3) -> Self {
        Light::Point {
            position,
            radiant_intensity,
        }
    }

    /// Sample the light from `point`: the unit direction towards the light,
    /// the distance to it and its radiant intensity.
    pub fn sample(&self, point: Point3, _rng: &mut impl Rng) -> (Vec3, Distance, Vec3) {
        match self {
            Light::Point {
                position,
                radiant_intensity,
            } => {
                let offset = *position - point;
                let distance = Distance::nm(offset.norm());

                (offset.normalized(), distance, *radiant_intensity)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Light::Point {
                position,
                radiant_intensity,
            } => {
                if !position.is_finite() {
                    return Err(Error::validation("point light position is not finite"));
                }

                if !radiant_intensity.is_finite()
                    || radiant_intensity.x < 0.0
                    || radiant_intensity.y < 0.0
                    || radiant_intensity.z < 0.0
                {
                    return Err(Error::validation(
                        "point light intensity must be non-negative",
                    ));
                }

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::*;

    #[test]
    fn test_sample() {
        let mut rng = XorShiftRng::seed_from_u64(0);

        let light = Light::point(Point3::new(0.0, 10.0, 0.0), Vec3::new(1.0, 2.0, 3.0));

        let (dir, dist, intensity) = light.sample(Point3::new(0.0, 4.0, 0.0), &mut rng);

        assert_eq!(dir, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(dist, Distance::nm(6.0));
        assert_eq!(intensity, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_validate() {
        assert!(Light::point(Point3::origin(), Vec3::new(1.0, 1.0, 1.0))
            .validate()
            .is_ok());

        assert!(Light::point(Point3::origin(), Vec3::new(-1.0, 1.0, 1.0))
            .validate()
            .is_err());

        assert!(
            Light::point(Point3::new(f64::NAN, 0.0, 0.0), Vec3::zero())
                .validate()
                .is_err()
        );
    }
}
