//! Error types for fitting and batch processing.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons an ellipse cannot be fitted to a marker point set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitError {
    /// Too few marker pixels were found.
    #[error("insufficient marker pixels: need {needed}, found {found}")]
    InsufficientMarker {
        /// Minimum number of points required.
        needed: usize,
        /// Number of points provided.
        found: usize,
    },
    /// All marker pixels coincide, so no major axis direction exists.
    #[error("degenerate marker: all points coincide, major axis has zero length")]
    DegenerateAxis,
}

/// Errors raised while running the image pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input image could not be opened or decoded.
    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Rendered image could not be encoded.
    #[error("failed to encode output for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Two inputs map to the same output file name.
    #[error("output name of {} collides with {}", path.display(), other.display())]
    OutputCollision { path: PathBuf, other: PathBuf },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
