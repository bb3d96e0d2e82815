//! Synthetic images for unit tests.

use std::path::Path;

use image::{Rgb, RgbImage};

/// Default marker color.
pub(crate) const MARKER: Rgb<u8> = Rgb([230, 60, 60]);
/// Neutral gray canvas that never matches the marker color.
pub(crate) const CANVAS: Rgb<u8> = Rgb([128, 128, 128]);

/// Gray canvas with single marker pixels at `(x, y)` positions.
pub(crate) fn canvas_with_markers(w: u32, h: u32, markers: &[(u32, u32)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(w, h, CANVAS);
    for &(x, y) in markers {
        img.put_pixel(x, y, MARKER);
    }
    img
}

/// Gray canvas with a solid axis-aligned marker ellipse.
pub(crate) fn canvas_with_ellipse(w: u32, h: u32, center: [f64; 2], axes: [f64; 2]) -> RgbImage {
    let mut img = RgbImage::from_pixel(w, h, CANVAS);
    for y in 0..h {
        for x in 0..w {
            let u = (x as f64 - center[0]) / axes[0];
            let v = (y as f64 - center[1]) / axes[1];
            if u * u + v * v <= 1.0 {
                img.put_pixel(x, y, MARKER);
            }
        }
    }
    img
}

/// Number of pixels equal to `color`.
pub(crate) fn count_color(img: &RgbImage, color: Rgb<u8>) -> usize {
    img.pixels().filter(|&&p| p == color).count()
}

/// Save `img` as PNG, panicking on failure.
pub(crate) fn save_png(img: &RgbImage, path: &Path) {
    img.save_with_format(path, image::ImageFormat::Png)
        .expect("write test png");
}
