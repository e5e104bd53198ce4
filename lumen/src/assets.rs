use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

/// A logical root texture and mesh assets are resolved against. Keeping the
/// lookup behind a trait lets tests and embedders feed assets from wherever
/// they want.
pub trait AssetRoot {
    /// Open the asset at the given root-relative path for reading.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>>;
}

/// An `AssetRoot` backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirRoot {
    root: PathBuf,
}

impl DirRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirRoot { root: root.into() }
    }
}

impl AssetRoot for DirRoot {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>> {
        let f = File::open(self.root.join(path))?;

        Ok(Box::new(BufReader::new(f)))
    }
}
