//! Ellipse descriptor and fit result types.

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Point};

/// The two marker points with maximal separation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FarthestPair {
    pub p0: Point,
    pub p1: Point,
    /// Squared distance between `p0` and `p1`.
    pub sq_dist: f64,
}

impl FarthestPair {
    /// Half the pair distance: the candidate semi-major length `a`.
    pub fn half_length(&self) -> f64 {
        self.sq_dist.sqrt() / 2.0
    }

    /// Vector `p1 - p0`.
    pub fn direction(&self) -> [f64; 2] {
        [self.p1[0] - self.p0[0], self.p1[1] - self.p0[1]]
    }

    pub fn midpoint(&self) -> Point {
        geometry::midpoint(self.p0, self.p1)
    }
}

/// Fitted ellipse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseDescriptor {
    /// Center (x, y) in image pixels.
    pub center: Point,
    /// Semi-major axis length, `>= semi_minor`.
    pub semi_major: f64,
    /// Semi-minor axis length, `>= 0`.
    pub semi_minor: f64,
    /// Major axis angle from +x in degrees (y down).
    pub angle_deg: f64,
}

impl EllipseDescriptor {
    pub fn angle_rad(&self) -> f64 {
        self.angle_deg.to_radians()
    }

    /// True when the ellipse has no interior.
    pub fn is_zero_area(&self) -> bool {
        self.semi_minor == 0.0 || self.semi_major == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.center[0].is_finite()
            && self.center[1].is_finite()
            && self.semi_major.is_finite()
            && self.semi_minor.is_finite()
            && self.angle_deg.is_finite()
    }

    /// Sample `n` points on the boundary.
    pub fn sample_points(&self, n: usize) -> Vec<Point> {
        let (sin_a, cos_a) = self.angle_rad().sin_cos();
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                let px = self.semi_major * t.cos();
                let py = self.semi_minor * t.sin();
                [
                    self.center[0] + cos_a * px - sin_a * py,
                    self.center[1] + sin_a * px + cos_a * py,
                ]
            })
            .collect()
    }
}

/// Segments and label anchors for the diagnostic render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisGuides {
    /// Major-axis candidate segment (the farthest pair).
    pub major: [Point; 2],
    /// Perpendicular segment through the center with half-length `b`.
    pub minor: [Point; 2],
    /// Top-left anchor of the `a=` label.
    pub label_a: Point,
    /// Top-left anchor of the `b=` label.
    pub label_b: Point,
}

/// Ellipse together with the intermediate quantities that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseFit {
    pub ellipse: EllipseDescriptor,
    pub pair: FarthestPair,
    /// Half the farthest-pair distance.
    pub a: f64,
    /// Maximum distance of any marker point to the pair segment.
    pub b: f64,
    /// Major and minor roles were exchanged because `b > a`.
    pub swapped: bool,
    /// Number of marker points used.
    pub n_points: usize,
}

impl EllipseFit {
    /// Axis segments and label anchors, `offset` pixels up-left of each anchor.
    ///
    /// The minor segment is always perpendicular to the pair segment, with
    /// half-length `b`, independent of any axis swap.
    pub fn guides(&self, offset: f64) -> AxisGuides {
        let [dx, dy] = self.pair.direction();
        let [cx, cy] = self.ellipse.center;
        // a > 0 is guaranteed by the fitter.
        let (perp_x, perp_y) = if self.a > 0.0 {
            (-dy / (2.0 * self.a) * self.b, dx / (2.0 * self.a) * self.b)
        } else {
            (0.0, self.b)
        };

        AxisGuides {
            major: [self.pair.p0, self.pair.p1],
            minor: [[cx - perp_x, cy - perp_y], [cx + perp_x, cy + perp_y]],
            label_a: [cx + dx / 2.0 - offset, cy + dy / 2.0 - offset],
            label_b: [cx + perp_x - offset, cy + perp_y - offset],
        }
    }

    pub fn label_a(&self) -> String {
        format!("a={:.1}", self.a)
    }

    pub fn label_b(&self) -> String {
        format!("b={:.1}", self.b)
    }
}
