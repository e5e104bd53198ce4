use log::warn;
use rand::Rng;

use geom::Distance;

use crate::{
    material::SurfaceInteraction,
    shape::T_MIN,
    Ray, Scene, Spectrum,
};

use super::AtomicStats;

/// Trace a ray through the scene and return the radiance flowing back along
/// it.
///
/// The recursion is bounded: every scattered ray is one bounce deeper than
/// its parent and rays beyond the configured depth contribute nothing. A ray
/// that goes numerically bad mid-path is logged and treated as a miss so a
/// single bad sample cannot abort a long render.
pub(crate) fn trace(
    scene: &Scene,
    ray: &Ray,
    stats: &AtomicStats,
    rng: &mut impl Rng,
) -> Spectrum {
    stats.count_ray();

    if !ray.is_valid() {
        warn!(
            "invalid ray at pixel ({}, {}) depth {}",
            ray.pixel_x, ray.pixel_y, ray.depth
        );
        stats.count_invalid();
        return Spectrum::black();
    }

    if ray.depth > scene.render_options.max_ray_depth {
        stats.count_exceeded_depth();
        return Spectrum::black();
    }

    // the scene's top level is a handful of nodes, a linear scan with a
    // shrinking window beats maintaining a scene-wide index; meshes are
    // internally accelerated by their own BVH
    let mut t_best = Distance::INFINITY;
    let mut nearest = None;

    for (i, node) in scene.nodes.iter().enumerate() {
        if let Some(hit) = node.shape.collide(ray, T_MIN, t_best) {
            t_best = hit.t;
            nearest = Some((hit, i));
        }
    }

    let Some((hit, node_index)) = nearest else {
        stats.count_left_scene();
        return Spectrum::black();
    };

    let si = SurfaceInteraction {
        outgoing: -ray.dir.normalized(),
        incoming: ray.clone(),
        hit,
        node: node_index,
    };

    let node = &scene.nodes[node_index];
    let resolution = node.material.resolve(&si, rng);

    let mut color = resolution.emission;
    color += node.material.direct_lighting(&si, scene, rng);

    for scattered in &resolution.scattered {
        color += trace(scene, scattered, stats, rng);
    }

    color
}
