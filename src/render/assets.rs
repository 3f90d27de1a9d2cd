//! Loading of image assets referenced by a project.

use crate::error::{Error, Result};
use crate::model::ImageMetadata;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads image files during one render call and remembers which ones failed.
///
/// A missing image never aborts rendering: the caller gets `None`, emits a
/// placeholder, and the path is recorded for the result.
#[derive(Debug, Default)]
pub struct AssetTracker {
    missing: Vec<PathBuf>,
}

impl AssetTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the bytes of an image, recording it as missing on failure.
    pub fn load(&mut self, metadata: &ImageMetadata) -> Option<Vec<u8>> {
        match read_asset(&metadata.path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                self.record_missing(&metadata.path, &err);
                None
            }
        }
    }

    /// Check that an image exists without reading it.
    pub fn check(&mut self, metadata: &ImageMetadata) -> bool {
        if metadata.source_exists() {
            return true;
        }
        let err = Error::AssetMissing(metadata.path.clone());
        self.record_missing(&metadata.path, &err);
        false
    }

    /// Record a failure that happened after the file was read.
    pub fn record_missing(&mut self, path: &Path, err: &Error) {
        log::warn!("{}; substituting placeholder", err);
        if !self.missing.iter().any(|p| p == path) {
            self.missing.push(path.to_path_buf());
        }
    }

    /// Paths that could not be loaded, in first-seen order.
    pub fn into_missing(self) -> Vec<PathBuf> {
        self.missing
    }
}

/// Read an asset file, mapping every failure to [`Error::AssetMissing`].
pub fn read_asset(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(Error::AssetMissing(path.to_path_buf()));
    }
    fs::read(path).map_err(|e| {
        log::debug!("reading {} failed: {}", path.display(), e);
        Error::AssetMissing(path.to_path_buf())
    })
}
