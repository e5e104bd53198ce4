use std::{fmt, io, num};

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building, loading or rendering a scene.
#[derive(Debug)]
pub enum Error {
    /// A scene, node, shape, material, camera, light or texture was rejected
    /// before rendering began.
    Validation(String),

    /// The caller canceled the render. The partial image is discarded.
    Cancelled,

    /// An asset (a texture image, a mesh file) could not be read.
    Asset(io::Error),

    /// Scene JSON could not be encoded or decoded.
    Json(serde_json::Error),

    /// A mesh file was malformed or truncated, therefore it was not possible
    /// to decode it.
    MeshFormat,

    /// Error while parsing a number in a mesh file.
    InvalidNumber,
}

impl Error {
    /// Shorthand for a `Validation` error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "validation failed: {}", msg),
            Error::Cancelled => write!(f, "render canceled"),
            Error::Asset(e) => write!(f, "cannot read asset: {}", e),
            Error::Json(e) => write!(f, "scene JSON error: {}", e),
            Error::MeshFormat => write!(f, "malformed mesh file"),
            Error::InvalidNumber => write!(f, "invalid number in mesh file"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Asset(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Asset(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<num::ParseFloatError> for Error {
    fn from(_e: num::ParseFloatError) -> Self {
        Error::InvalidNumber
    }
}

impl From<num::ParseIntError> for Error {
    fn from(_e: num::ParseIntError) -> Self {
        Error::InvalidNumber
    }
}
