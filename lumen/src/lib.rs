//! A physically based Monte-Carlo path tracer.
//!
//! A [`Scene`] collects named nodes (a [`Shape`] plus a [`Material`]),
//! lights and cameras; [`render`] partitions the image into tiles,
//! distributes them over the hardware threads and traces every pixel with
//! next-event estimation at each bounce. Given the same seed and options a
//! render is byte-for-byte reproducible no matter how many workers run.

pub mod assets;
pub mod camera;
pub mod error;
pub mod light;
pub mod material;
pub mod obj;
pub mod ray;
pub mod render;
pub mod scene;
pub mod shape;
pub mod spectrum;
pub mod texture;

pub use camera::Camera;
pub use error::{Error, Result};
pub use light::Light;
pub use material::{Material, Resolution, SurfaceInteraction};
pub use ray::Ray;
pub use render::{render, render_with_cancel, Artifact, CancelFlag, RenderOptions, Stats};
pub use scene::{Node, Scene};
pub use shape::{Shape, SurfaceHit};
pub use spectrum::Spectrum;
pub use texture::Texture;
