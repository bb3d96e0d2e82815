//! Ellipse polygonization and drawing on RGB buffers.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as IPoint;

use crate::fit::EllipseDescriptor;
use crate::geometry::Point;

/// Integer raster parameters: center and semi-axes truncated toward zero.
pub fn raster_params(e: &EllipseDescriptor) -> ([i32; 2], [i32; 2]) {
    (
        [e.center[0] as i32, e.center[1] as i32],
        [e.semi_major as i32, e.semi_minor as i32],
    )
}

/// Angular step in degrees for an ellipse with the given largest semi-axis.
fn angular_step_deg(max_axis: i32) -> usize {
    match max_axis {
        i32::MIN..=2 => 90,
        3..=9 => 30,
        10..=14 => 18,
        _ => 5,
    }
}

/// Closed polygon approximating the ellipse, without a repeated end vertex.
pub fn ellipse_polygon(center: [i32; 2], axes: [i32; 2], angle_deg: f64) -> Vec<IPoint<i32>> {
    let (sin_a, cos_a) = angle_deg.to_radians().sin_cos();
    let (a, b) = (axes[0].max(0) as f64, axes[1].max(0) as f64);
    let step = angular_step_deg(axes[0].max(axes[1]));

    let mut poly: Vec<IPoint<i32>> = Vec::with_capacity(360 / step);
    for deg in (0..360).step_by(step) {
        let (st, ct) = (deg as f64).to_radians().sin_cos();
        let x = center[0] as f64 + a * ct * cos_a - b * st * sin_a;
        let y = center[1] as f64 + a * ct * sin_a + b * st * cos_a;
        let p = IPoint::new(x.round() as i32, y.round() as i32);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    poly
}

fn to_f32(p: IPoint<i32>) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

fn draw_closed_outline(img: &mut RgbImage, poly: &[IPoint<i32>], color: Rgb<u8>) {
    match poly {
        [] => {}
        [p] => {
            let (w, h) = img.dimensions();
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
                img.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        _ => {
            for (i, &p) in poly.iter().enumerate() {
                let q = poly[(i + 1) % poly.len()];
                draw_line_segment_mut(img, to_f32(p), to_f32(q), color);
            }
        }
    }
}

/// Draw the ellipse boundary one pixel wide.
pub fn draw_ellipse_outline(img: &mut RgbImage, e: &EllipseDescriptor, color: Rgb<u8>) {
    let (center, axes) = raster_params(e);
    let poly = ellipse_polygon(center, axes, e.angle_deg);
    draw_closed_outline(img, &poly, color);
}

/// Draw the ellipse interior and boundary.
///
/// Zero-area ellipses degrade to their boundary line.
pub fn draw_ellipse_filled(img: &mut RgbImage, e: &EllipseDescriptor, color: Rgb<u8>) {
    let (center, axes) = raster_params(e);
    let poly = ellipse_polygon(center, axes, e.angle_deg);
    if poly.len() >= 3 {
        draw_polygon_mut(img, &poly, color);
    }
    draw_closed_outline(img, &poly, color);
}

/// Draw a one-pixel line segment between real-valued points.
pub fn draw_segment(img: &mut RgbImage, p0: Point, p1: Point, color: Rgb<u8>) {
    draw_line_segment_mut(
        img,
        (p0[0] as f32, p0[1] as f32),
        (p1[0] as f32, p1[1] as f32),
        color,
    );
}
