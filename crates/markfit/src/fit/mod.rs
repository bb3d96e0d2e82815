//! Ellipse fitting from a marker point cloud.
//!
//! Implements:
//! - Farthest-pair search defining the major-axis candidate (the diameter).
//! - Maximum clamped distance to that segment defining the minor half-width.
//! - Axis selection with a 90° swap when the spread exceeds half the diameter.

mod diameter;
mod ellipse;
mod types;

pub use diameter::{convex_hull, farthest_pair, farthest_pair_hull};
pub use ellipse::{build_descriptor, fit_ellipse, max_deviation};
pub use types::{AxisGuides, EllipseDescriptor, EllipseFit, FarthestPair};
