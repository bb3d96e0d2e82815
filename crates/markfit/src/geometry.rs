//! Planar geometry primitives over image-space points.
//!
//! Points are `[x, y]` in pixel coordinates with y increasing downward.

use nalgebra::Vector2;

/// A point in image pixel space.
pub type Point = [f64; 2];

#[inline]
fn to_vec2(p: Point) -> Vector2<f64> {
    Vector2::new(p[0], p[1])
}

/// Squared Euclidean distance between two points.
#[inline]
pub fn squared_distance(p: Point, q: Point) -> f64 {
    (to_vec2(q) - to_vec2(p)).norm_squared()
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(p: Point, q: Point) -> f64 {
    (q[0] - p[0]).hypot(q[1] - p[1])
}

/// Midpoint of the segment `[p0, p1]`.
#[inline]
pub fn midpoint(p0: Point, p1: Point) -> Point {
    [(p0[0] + p1[0]) / 2.0, (p0[1] + p1[1]) / 2.0]
}

/// Distance from `q` to the closed segment `[p0, p1]`.
///
/// The projection parameter is clamped to `[0, 1]`, so points whose
/// perpendicular foot falls outside the segment measure to the nearest
/// endpoint rather than to the infinite line. A zero-length segment is
/// treated as the point `p0`.
pub fn distance_to_segment(q: Point, p0: Point, p1: Point) -> f64 {
    let d = to_vec2(p1) - to_vec2(p0);
    let len_sq = d.norm_squared();
    if len_sq == 0.0 {
        return distance(q, p0);
    }

    let t = ((to_vec2(q) - to_vec2(p0)).dot(&d) / len_sq).clamp(0.0, 1.0);
    let proj = to_vec2(p0) + d * t;
    (to_vec2(q) - proj).norm()
}

/// Angle of the direction `p0 -> p1` from +x, in degrees.
///
/// With y pointing down, positive angles turn clockwise on screen.
#[inline]
pub fn direction_angle_deg(p0: Point, p1: Point) -> f64 {
    (p1[1] - p0[1]).atan2(p1[0] - p0[0]).to_degrees()
}
