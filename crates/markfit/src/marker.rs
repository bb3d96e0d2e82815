//! Marker pixel extraction.

use image::RgbImage;

use crate::config::MarkerConfig;
use crate::geometry::Point;

/// Collect the coordinates of all pixels matching the marker color.
///
/// The image is scanned column by column (x outer, y inner); this order is
/// what farthest-pair tie-breaking sees.
pub fn extract_marker_points(image: &RgbImage, config: &MarkerConfig) -> Vec<Point> {
    let (w, h) = image.dimensions();
    let mut points = Vec::new();
    for x in 0..w {
        for y in 0..h {
            if config.matches(image.get_pixel(x, y).0) {
                points.push([x as f64, y as f64]);
            }
        }
    }
    points
}
