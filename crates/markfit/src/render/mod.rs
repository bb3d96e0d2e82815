//! Output renders for a fitted marker.
//!
//! Two images are produced per input:
//! - **filled**: the ellipse silhouette on a solid background,
//! - **marked**: the original image with the ellipse outline, both axis
//!   segments and `a=`/`b=` labels drawn on top.

mod font;
mod raster;

pub use font::draw_text;
pub use raster::{
    draw_ellipse_filled, draw_ellipse_outline, draw_segment, ellipse_polygon, raster_params,
};

use image::{Rgb, RgbImage};

use crate::config::RenderConfig;
use crate::fit::{EllipseDescriptor, EllipseFit};

/// Silhouette render: background color with the filled ellipse.
pub fn render_filled(
    width: u32,
    height: u32,
    ellipse: &EllipseDescriptor,
    config: &RenderConfig,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb(config.background));
    draw_ellipse_filled(&mut img, ellipse, Rgb(config.fill_color));
    img
}

/// Diagnostic render layered on a copy of `original`.
pub fn render_marked(original: &RgbImage, fit: &EllipseFit, config: &RenderConfig) -> RgbImage {
    let color = Rgb(config.annotation_color);
    let mut img = original.clone();

    draw_ellipse_outline(&mut img, &fit.ellipse, color);

    let guides = fit.guides(config.label_offset_px);
    draw_segment(&mut img, guides.major[0], guides.major[1], color);
    draw_segment(&mut img, guides.minor[0], guides.minor[1], color);

    draw_text(
        &mut img,
        guides.label_a[0] as i32,
        guides.label_a[1] as i32,
        &fit.label_a(),
        color,
    );
    draw_text(
        &mut img,
        guides.label_b[0] as i32,
        guides.label_b[1] as i32,
        &fit.label_b(),
        color,
    );
    img
}
