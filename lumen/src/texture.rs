use std::io::Read;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use image::RgbImage;

use crate::{
    assets::AssetRoot,
    error::{Error, Result},
    Spectrum,
};

/// How an `Image` texture resolves a sample between pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// Round to the nearest pixel.
    Nearest,
    /// Blend the four surrounding pixels.
    Bilinear,
}

/// How an `Image` texture handles UV coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wrap {
    /// Keep the fractional part, tiling the image.
    Repeat,
    /// Clamp to the image border.
    Clamp,
}

/// A color that varies over a surface, indexed by UV coordinates.
///
/// Textures are shared between materials through `Arc` and are immutable
/// once the scene validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Data")]
pub enum Texture {
    /// The same color everywhere.
    Uniform { color: Spectrum },

    /// Two sub-textures alternating in a grid controlled by an angular
    /// spatial frequency.
    Checkerboard {
        even: Arc<Texture>,
        odd: Arc<Texture>,
        frequency: f64,
    },

    /// A file-backed raster.
    Image(ImageTexture),
}

/// A raster-backed texture with configurable wrapping and interpolation.
///
/// The decoded raster does not travel with scene JSON: after decoding a
/// scene, `load` must run again against an asset root before the scene
/// validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTexture {
    pub path: String,
    pub interpolation: Interpolation,
    pub wrap: Wrap,

    #[serde(skip)]
    raster: Option<Arc<RgbImage>>,
}

impl Texture {
    /// Shorthand for a `Uniform` texture.
    pub fn uniform(color: Spectrum) -> Arc<Texture> {
        Arc::new(Texture::Uniform { color })
    }

    /// Shorthand for a `Checkerboard` texture.
    pub fn checkerboard(even: Arc<Texture>, odd: Arc<Texture>, frequency: f64) -> Arc<Texture> {
        Arc::new(Texture::Checkerboard {
            even,
            odd,
            frequency,
        })
    }

    /// Sample the texture at the given UV coordinates.
    pub fn sample(&self, u: f64, v: f64) -> Spectrum {
        match self {
            Texture::Uniform { color } => *color,
            Texture::Checkerboard {
                even,
                odd,
                frequency,
            } => {
                if (frequency * u).sin() * (frequency * v).sin() < 0.0 {
                    odd.sample(u, v)
                } else {
                    even.sample(u, v)
                }
            }
            Texture::Image(img) => img.sample(u, v),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Texture::Uniform { color } => {
                if !color.is_finite() {
                    return Err(Error::validation("uniform texture color is not finite"));
                }
                Ok(())
            }
            Texture::Checkerboard {
                even,
                odd,
                frequency,
            } => {
                if !frequency.is_finite() || *frequency <= 0.0 {
                    return Err(Error::validation(
                        "checkerboard frequency must be positive",
                    ));
                }
                even.validate()?;
                odd.validate()
            }
            Texture::Image(img) => img.validate(),
        }
    }
}

impl ImageTexture {
    /// Load the raster at `path` from the given asset root.
    pub fn load(
        path: impl Into<String>,
        interpolation: Interpolation,
        wrap: Wrap,
        root: &dyn AssetRoot,
    ) -> Result<Self> {
        let path = path.into();

        let mut data = vec![];
        root.open(&path)?.read_to_end(&mut data)?;

        let raster = image::load_from_memory(&data)
            .map_err(|e| Error::validation(format!("cannot decode texture {}: {}", path, e)))?
            .to_rgb8();

        Ok(ImageTexture {
            path,
            interpolation,
            wrap,
            raster: Some(Arc::new(raster)),
        })
    }

    /// Build an `ImageTexture` around an already decoded raster.
    pub fn from_raster(raster: RgbImage, interpolation: Interpolation, wrap: Wrap) -> Self {
        ImageTexture {
            path: String::new(),
            interpolation,
            wrap,
            raster: Some(Arc::new(raster)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match &self.raster {
            Some(r) if r.width() > 0 && r.height() > 0 => Ok(()),
            Some(_) => Err(Error::validation("image texture raster is empty")),
            None => Err(Error::validation(format!(
                "image texture {:?} has no backing raster",
                self.path
            ))),
        }
    }

    /// Sample the raster, wrapping the UV coordinates and flipping `v` into
    /// image space first. Without a backing raster the sample is a loud
    /// magenta.
    pub fn sample(&self, u: f64, v: f64) -> Spectrum {
        let raster = match &self.raster {
            Some(r) => r,
            None => return Spectrum::sentinel(),
        };

        let wrap = |c: f64| match self.wrap {
            Wrap::Repeat => c.rem_euclid(1.0),
            Wrap::Clamp => c.clamp(0.0, 1.0),
        };

        let u = wrap(u);
        let v = 1.0 - wrap(v);

        let (w, h) = (raster.width() as f64, raster.height() as f64);

        let pixel = |x: u32, y: u32| {
            let p = raster.get_pixel(x.min(raster.width() - 1), y.min(raster.height() - 1));
            Spectrum::new(
                f64::from(p[0]) / 255.0,
                f64::from(p[1]) / 255.0,
                f64::from(p[2]) / 255.0,
            )
        };

        match self.interpolation {
            Interpolation::Nearest => {
                let x = (u * (w - 1.0)).round() as u32;
                let y = (v * (h - 1.0)).round() as u32;
                pixel(x, y)
            }
            Interpolation::Bilinear => {
                let x = u * (w - 1.0);
                let y = v * (h - 1.0);

                let (x0, y0) = (x.floor(), y.floor());
                let (fx, fy) = (x - x0, y - y0);
                let (x0, y0) = (x0 as u32, y0 as u32);

                let p00 = pixel(x0, y0);
                let p10 = pixel(x0 + 1, y0);
                let p01 = pixel(x0, y0 + 1);
                let p11 = pixel(x0 + 1, y0 + 1);

                let top = p00 * (1.0 - fx) + p10 * fx;
                let bottom = p01 * (1.0 - fx) + p11 * fx;

                top * (1.0 - fy) + bottom * fy
            }
        }
    }
}
