//! Farthest-pair (diameter) search over a marker point set.

use crate::geometry::{squared_distance, Point};

use super::types::FarthestPair;

/// Exhaustive all-pairs search for the two points with maximal separation.
///
/// Pairs are visited as `(i, j)` with `i` increasing, then `j > i`. A pair
/// replaces the current best only when strictly farther, so among equal
/// maxima the first visited pair is kept. Returns `None` when fewer than two
/// points are given or when every point coincides.
pub fn farthest_pair(points: &[Point]) -> Option<FarthestPair> {
    let mut best_sq = 0.0;
    let mut best: Option<(usize, usize)> = None;

    for (i, &pi) in points.iter().enumerate() {
        for (j, &pj) in points.iter().enumerate().skip(i + 1) {
            let sq = squared_distance(pi, pj);
            if sq > best_sq {
                best_sq = sq;
                best = Some((i, j));
            }
        }
    }

    best.map(|(i, j)| FarthestPair {
        p0: points[i],
        p1: points[j],
        sq_dist: best_sq,
    })
}

/// Farthest pair restricted to convex hull vertices.
///
/// The diameter of a point set is attained on its hull, so the distance
/// matches [`farthest_pair`]; which of several equal pairs is returned, and
/// their order, may differ.
pub fn farthest_pair_hull(points: &[Point]) -> Option<FarthestPair> {
    farthest_pair(&convex_hull(points))
}

#[inline]
fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Convex hull by Andrew's monotone chain, counter-clockwise in a y-up frame.
///
/// Collinear boundary points are dropped. Inputs with fewer than three
/// distinct points are returned deduplicated.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|p, q| p[0].total_cmp(&q[0]).then(p[1].total_cmp(&q[1])));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(2 * pts.len());
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    // Last point repeats the first.
    hull.pop();
    hull
}
