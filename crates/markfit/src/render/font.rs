//! Minimal 5x7 bitmap glyphs for axis labels.

use image::{Rgb, RgbImage};

const GLYPH_W: i32 = 5;
const GLYPH_H: usize = 7;
/// Horizontal advance per character, including one column of spacing.
const ADVANCE: i32 = GLYPH_W + 1;

/// Row bitmaps, bit 4 is the leftmost column.
fn glyph(c: char) -> Option<[u8; GLYPH_H]> {
    let rows = match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F],
        'b' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E],
        '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        _ => return None,
    };
    Some(rows)
}

/// Draw `text` with its top-left corner at `(x, y)`.
///
/// Pixels outside the canvas are clipped. Characters without a glyph
/// advance the cursor and draw nothing.
pub fn draw_text(img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let mut cursor = x;
    for c in text.chars() {
        if let Some(rows) = glyph(c) {
            for (row, &bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (0x10u8 >> col) == 0 {
                        continue;
                    }
                    let px = cursor as i64 + col as i64;
                    let py = y as i64 + row as i64;
                    if px >= 0 && py >= 0 && px < w && py < h {
                        img.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
        cursor = cursor.saturating_add(ADVANCE);
    }
}
