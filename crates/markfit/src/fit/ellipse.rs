//! Ellipse construction from the farthest pair and the perpendicular spread.

use crate::config::{DiameterSearch, FitConfig};
use crate::error::FitError;
use crate::geometry::{direction_angle_deg, distance_to_segment, Point};

use super::diameter::{farthest_pair, farthest_pair_hull};
use super::types::{EllipseDescriptor, EllipseFit, FarthestPair};

/// Largest distance from any point to the segment `[p0, p1]`.
///
/// Returns `0.0` for an empty point set.
pub fn max_deviation(points: &[Point], p0: Point, p1: Point) -> f64 {
    points
        .iter()
        .map(|&q| distance_to_segment(q, p0, p1))
        .fold(0.0, f64::max)
}

/// Build the descriptor from the farthest pair and the deviation `b`.
///
/// With `a` the pair half-length, the pair direction is the major axis when
/// `a >= b`. Otherwise the roles swap and the major axis is rotated 90°
/// from the pair direction, keeping `semi_major >= semi_minor`.
pub fn build_descriptor(pair: &FarthestPair, b: f64) -> EllipseDescriptor {
    let a = pair.half_length();
    let angle = direction_angle_deg(pair.p0, pair.p1);
    let (semi_major, semi_minor, angle_deg) = if a >= b {
        (a, b, angle)
    } else {
        (b, a, angle + 90.0)
    };

    EllipseDescriptor {
        center: pair.midpoint(),
        semi_major,
        semi_minor,
        angle_deg,
    }
}

/// Fit an ellipse to a marker point set.
///
/// # Errors
/// - [`FitError::InsufficientMarker`] when fewer than `config.min_points`
///   (at least 2) points are given.
/// - [`FitError::DegenerateAxis`] when all points coincide.
pub fn fit_ellipse(points: &[Point], config: &FitConfig) -> Result<EllipseFit, FitError> {
    let needed = config.min_points.max(2);
    if points.len() < needed {
        return Err(FitError::InsufficientMarker {
            needed,
            found: points.len(),
        });
    }

    let pair = match config.diameter_search {
        DiameterSearch::Exhaustive => farthest_pair(points),
        DiameterSearch::ConvexHull => farthest_pair_hull(points),
    }
    .ok_or(FitError::DegenerateAxis)?;

    let a = pair.half_length();
    if a <= 0.0 || !a.is_finite() {
        return Err(FitError::DegenerateAxis);
    }

    let b = max_deviation(points, pair.p0, pair.p1);
    let ellipse = build_descriptor(&pair, b);

    tracing::debug!(
        n_points = points.len(),
        a,
        b,
        swapped = a < b,
        angle_deg = ellipse.angle_deg,
        "ellipse fitted"
    );

    Ok(EllipseFit {
        ellipse,
        pair,
        a,
        b,
        swapped: a < b,
        n_points: points.len(),
    })
}
