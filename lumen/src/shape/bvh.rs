use serde::{Deserialize, Serialize};

use geom::{Aabb, Distance};

use crate::{
    error::{Error, Result},
    Ray,
};

use super::{Shape, SurfaceHit};

/// Construction parameters of the [Bounding volume hierarchy][0].
///
/// [0]: https://en.wikipedia.org/wiki/Bounding_volume_hierarchy
const MAX_DEPTH: u32 = 32;
const MIN_SHAPES_PER_LEAF: usize = 4;
const BINS: usize = 16;

/// Below this many shapes building the two subtrees in parallel costs more
/// than it saves.
const PARALLEL_BUILD_THRESHOLD: usize = 4096;

/// An internal node of a bounding volume hierarchy over shapes.
///
/// Construction partitions shapes with a binned [surface area heuristic][0]
/// along the longest axis of the parent bounding box, falling back to a
/// median split by centroid when no binned split beats keeping the node
/// whole.
///
/// [0]: https://en.wikipedia.org/wiki/Bounding_volume_hierarchy#Construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bvh {
    bounds: Aabb,
    left: Box<Shape>,
    right: Box<Shape>,
}

/// A leaf holding a small list of shapes scanned linearly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    shapes: Vec<Shape>,
}

impl Bvh {
    /// Partition `shapes` into a tree of `Bvh` nodes with `Group` leaves.
    ///
    /// Panics if `shapes` is empty.
    pub fn build(shapes: Vec<Shape>) -> Shape {
        assert!(!shapes.is_empty());

        let boxed: Vec<(Shape, Aabb)> = shapes
            .into_iter()
            .map(|s| {
                let bounds = s.bounds();
                (s, bounds)
            })
            .collect();

        Self::build_node(boxed, 0)
    }

    fn build_node(mut shapes: Vec<(Shape, Aabb)>, depth: u32) -> Shape {
        if shapes.len() == 1 {
            return shapes.pop().unwrap().0;
        }

        if depth >= MAX_DEPTH || shapes.len() <= MIN_SHAPES_PER_LEAF {
            return Shape::Group(Group::new(shapes.into_iter().map(|(s, _)| s).collect()));
        }

        let parent = shapes
            .iter()
            .skip(1)
            .fold(shapes[0].1.clone(), |acc, (_, b)| acc.union(b));
        let axis = parent.longest_axis();

        let (left, right) = match binned_sah_split(&shapes, &parent) {
            Some(split_bin) => {
                let (left, right): (Vec<_>, Vec<_>) = shapes
                    .into_iter()
                    .partition(|(_, b)| bin_of(b, &parent) <= split_bin);

                if left.is_empty() || right.is_empty() {
                    // every centroid binned to one side, a median split
                    // still makes progress
                    let mut all: Vec<_> = left.into_iter().chain(right).collect();
                    median_split(&mut all, axis)
                } else {
                    (left, right)
                }
            }
            None => median_split(&mut shapes, axis),
        };

        let (left, right) = if left.len() + right.len() >= PARALLEL_BUILD_THRESHOLD {
            rayon::join(
                || Self::build_node(left, depth + 1),
                || Self::build_node(right, depth + 1),
            )
        } else {
            (
                Self::build_node(left, depth + 1),
                Self::build_node(right, depth + 1),
            )
        };

        Shape::Bvh(Bvh {
            bounds: parent,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, t_max: Distance) -> Option<SurfaceHit> {
        if !self
            .bounds
            .hit(ray.origin, ray.dir, t_min.as_nm(), t_max.as_nm())
        {
            return None;
        }

        let left = self.left.collide(ray, t_min, t_max);
        let t_max = left.as_ref().map_or(t_max, |h| h.t);

        // the right traversal only reports hits closer than the left one
        // since its window shrank to the left hit
        self.right.collide(ray, t_min, t_max).or(left)
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds.clone()
    }

    /// The two subtrees of this node.
    pub fn children(&self) -> (&Shape, &Shape) {
        (&self.left, &self.right)
    }

    pub fn validate(&self) -> Result<()> {
        self.left.validate()?;
        self.right.validate()
    }
}

impl Group {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Group { shapes }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn collide(&self, ray: &Ray, t_min: Distance, mut t_max: Distance) -> Option<SurfaceHit> {
        let mut nearest = None;

        for shape in &self.shapes {
            if let Some(hit) = shape.collide(ray, t_min, t_max) {
                t_max = hit.t;
                nearest = Some(hit);
            }
        }

        nearest
    }

    pub fn bounds(&self) -> Aabb {
        self.shapes
            .iter()
            .skip(1)
            .fold(self.shapes[0].bounds(), |acc, s| acc.union(&s.bounds()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.shapes.is_empty() {
            return Err(Error::validation("group has no shapes"));
        }

        for shape in &self.shapes {
            shape.validate()?;
        }

        Ok(())
    }
}

/// The bin index of a bounding box centroid along the longest axis of
/// `parent`. Centroids on the upper edge clamp into the last bin.
fn bin_of(bounds: &Aabb, parent: &Aabb) -> usize {
    let axis = parent.longest_axis();

    let lo = parent.min()[axis];
    let extent = parent.dimensions()[axis];

    if extent <= 0.0 {
        return 0;
    }

    let t = (bounds.center()[axis] - lo) / extent;

    ((t * BINS as f64) as usize).min(BINS - 1)
}

/// Evaluate the 15 candidate splits between bins and return the best split
/// bin, or `None` when no candidate beats leaving the node unsplit.
fn binned_sah_split(shapes: &[(Shape, Aabb)], parent: &Aabb) -> Option<usize> {
    let mut bin_bounds: [Option<Aabb>; BINS] = Default::default();
    let mut bin_counts = [0_usize; BINS];

    for (_, b) in shapes {
        let i = bin_of(b, parent);
        bin_counts[i] += 1;
        bin_bounds[i] = Some(match bin_bounds[i].take() {
            Some(acc) => acc.union(b),
            None => b.clone(),
        });
    }

    // running unions and counts from the left and from the right
    let mut left_bounds: Vec<Option<Aabb>> = Vec::with_capacity(BINS);
    let mut left_counts = Vec::with_capacity(BINS);
    let mut acc: Option<Aabb> = None;
    let mut n = 0;
    for i in 0..BINS {
        acc = union_opt(acc, &bin_bounds[i]);
        n += bin_counts[i];
        left_bounds.push(acc.clone());
        left_counts.push(n);
    }

    let mut right_bounds: Vec<Option<Aabb>> = vec![None; BINS];
    let mut right_counts = vec![0; BINS];
    let mut acc: Option<Aabb> = None;
    let mut n = 0;
    for i in (0..BINS).rev() {
        acc = union_opt(acc, &bin_bounds[i]);
        n += bin_counts[i];
        right_bounds[i] = acc.clone();
        right_counts[i] = n;
    }

    let parent_area = parent.surface_area();
    if parent_area <= 0.0 {
        return None;
    }

    let cost_of = |i: usize| -> Option<f64> {
        let l = left_bounds[i].as_ref()?;
        let r = right_bounds[i + 1].as_ref()?;

        Some(
            1.0 + l.surface_area() / parent_area * left_counts[i] as f64
                + r.surface_area() / parent_area * right_counts[i + 1] as f64,
        )
    };

    let leaf_cost = shapes.len() as f64;

    (0..BINS - 1)
        .filter_map(|i| cost_of(i).map(|c| (i, c)))
        .min_by(|(_, c0), (_, c1)| c0.total_cmp(c1))
        .filter(|(_, cost)| *cost < leaf_cost)
        .map(|(i, _)| i)
}

fn union_opt(acc: Option<Aabb>, b: &Option<Aabb>) -> Option<Aabb> {
    match (acc, b) {
        (Some(acc), Some(b)) => Some(acc.union(b)),
        (Some(acc), None) => Some(acc),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    }
}

/// Split the shapes in two halves around the median centroid along `axis`.
fn median_split(
    shapes: &mut Vec<(Shape, Aabb)>,
    axis: geom::Axis,
) -> (Vec<(Shape, Aabb)>, Vec<(Shape, Aabb)>) {
    let pivot = shapes.len() / 2;

    // select_nth actually partitions the shapes so that centroids before
    // the pivot are smaller than the median and the ones after are greater
    shapes.select_nth_unstable_by(pivot, |(_, b0), (_, b1)| {
        b0.center()[axis].total_cmp(&b1.center()[axis])
    });

    let right = shapes.split_off(pivot);

    (std::mem::take(shapes), right)
}
