//! Random direction sampling used by materials and cameras.
//!
//! Every function takes the caller's `Rng` so that a render seeded the same
//! way always draws the same sequence of directions.

use rand::Rng;

use crate::Vec3;

/// Sample a point uniformly inside the unit sphere by rejection sampling the
/// unit cube.
pub fn in_unit_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
        );

        if v.norm2() < 1.0 {
            return v;
        }
    }
}

/// Sample a direction uniformly over the surface of the unit sphere.
pub fn unit_vector(rng: &mut impl Rng) -> Vec3 {
    in_unit_sphere(rng).normalized()
}

/// Sample a point uniformly inside the unit disk laying on the XY plane by
/// rejection sampling the enclosing square.
pub fn in_unit_disk(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
            0.0,
        );

        if v.norm2() < 1.0 {
            return v;
        }
    }
}

/// Sample a direction over the hemisphere around `normal` with a probability
/// proportional to the cosine of the angle with the normal itself.
///
/// Two uniform variates pick a point on the unit disk which is then projected
/// onto the hemisphere through an orthonormal basis around `normal`.
pub fn cosine_weighted_hemisphere(normal: Vec3, rng: &mut impl Rng) -> Vec3 {
    let r1 = rng.gen::<f64>();
    let r2 = rng.gen::<f64>();

    let phi = 2.0 * std::f64::consts::PI * r1;
    let r = r2.sqrt();

    let x = phi.cos() * r;
    let y = phi.sin() * r;
    let z = (1.0 - r2).max(0.0).sqrt();

    let (u, v) = onb(normal);

    (u * x + v * y + normal * z).normalized()
}

/// Build two unit vectors orthogonal to `normal` and to each other. The
/// helper axis is picked per component so that it is never parallel to
/// `normal`.
fn onb(normal: Vec3) -> (Vec3, Vec3) {
    let helper = if normal.x.abs() > 0.9 {
        Vec3::new(0.0, 1.0, 0.0)
    } else {
        Vec3::new(1.0, 0.0, 0.0)
    };

    let u = normal.cross(&helper).normalized();
    let v = normal.cross(&u);

    (u, v)
}
