//! markfit: fit an ellipse to a colored marker blob in raster images.
//!
//! The pipeline stages are:
//!
//! 1. **Marker** – collect pixels whose RGB value matches the marker color.
//! 2. **Fit** – farthest pair of marker pixels as the major-axis candidate,
//!    largest clamped distance to that segment as the minor half-width,
//!    axes swapped when the spread exceeds half the diameter.
//! 3. **Render** – a filled silhouette on a solid background and a
//!    diagnostic overlay with outline, axes and `a=`/`b=` labels.
//! 4. **Pipeline** – directory batch driver writing both renders per image.
//!
//! # Example
//!
//! ```
//! use markfit::{fit_ellipse, FitConfig};
//!
//! let points = [[5.0, 25.0], [25.0, 30.0], [45.0, 25.0]];
//! let fit = fit_ellipse(&points, &FitConfig::default())?;
//! assert_eq!(fit.ellipse.center, [25.0, 25.0]);
//! assert_eq!(fit.ellipse.semi_major, 20.0);
//! assert_eq!(fit.ellipse.semi_minor, 5.0);
//! # Ok::<(), markfit::FitError>(())
//! ```

pub mod config;
pub mod error;
pub mod fit;
pub mod geometry;
pub mod marker;
pub mod pipeline;
pub mod render;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{DiameterSearch, FitConfig, MarkerConfig, PipelineConfig, RenderConfig};
pub use error::{FitError, PipelineError};
pub use fit::{fit_ellipse, AxisGuides, EllipseDescriptor, EllipseFit, FarthestPair};
pub use geometry::{distance_to_segment, Point};
pub use marker::extract_marker_points;
pub use pipeline::{BatchReport, ImageOutcome, ImageReport, ImageStatus, Pipeline};
pub use render::{render_filled, render_marked};
