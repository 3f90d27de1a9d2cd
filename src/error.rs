//! Error types for the tacexport library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::convert::Target;

/// Result type alias for tacexport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while compiling a project.
#[derive(Error, Debug)]
pub enum Error {
    /// The target selector is not one of the supported formats.
    #[error("Unsupported export target: {0}")]
    UnsupportedTarget(String),

    /// The artifact could not be produced or written.
    #[error("Failed to write {target} artifact for \"{document}\": {source}")]
    ArtifactWriteFailed {
        /// Target that was being compiled
        target: Target,
        /// Name of the project being compiled
        document: String,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// A referenced image file does not exist or cannot be read.
    ///
    /// Renderers recover from this locally by emitting a placeholder.
    #[error("Image asset missing: {}", .0.display())]
    AssetMissing(PathBuf),

    /// A paragraph contains unbalanced inline style markers.
    ///
    /// Recovered locally by treating the offending marker as literal text.
    #[error("Malformed inline markup in paragraph {0}")]
    MalformedInlineMarkup(String),

    /// An image paragraph carries a metadata record that cannot be parsed.
    #[error("Invalid image metadata in paragraph {0}")]
    InvalidImageMetadata(String),

    /// I/O error when reading assets or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error assembling the zip container.
    #[error("Package error: {0}")]
    Package(String),

    /// Error producing the paginated page description.
    #[error("Layout error: {0}")]
    Layout(String),

    /// Generic rendering error.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Check whether the error is one renderers recover from on their own.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::AssetMissing(_) | Error::MalformedInlineMarkup(_) | Error::InvalidImageMetadata(_)
        )
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Package(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON error: {}", err))
    }
}
