/// A tiny 3x5 bitmap font for status text drawn straight into frames.
/// Letters are upper-cased; unknown characters render as a solid block.
use image::{Rgb, RgbImage};

const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

/// Each row is 3 bits, most significant bit on the left.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        'A' => [0x2, 0x5, 0x7, 0x5, 0x5],
        'B' => [0x6, 0x5, 0x6, 0x5, 0x6],
        'C' => [0x3, 0x4, 0x4, 0x4, 0x3],
        'D' => [0x6, 0x5, 0x5, 0x5, 0x6],
        'E' => [0x7, 0x4, 0x6, 0x4, 0x7],
        'F' => [0x7, 0x4, 0x6, 0x4, 0x4],
        'G' => [0x3, 0x4, 0x5, 0x5, 0x3],
        'H' => [0x5, 0x5, 0x7, 0x5, 0x5],
        'I' => [0x7, 0x2, 0x2, 0x2, 0x7],
        'J' => [0x1, 0x1, 0x1, 0x5, 0x2],
        'K' => [0x5, 0x5, 0x6, 0x5, 0x5],
        'L' => [0x4, 0x4, 0x4, 0x4, 0x7],
        'M' => [0x5, 0x7, 0x7, 0x5, 0x5],
        'N' => [0x6, 0x5, 0x5, 0x5, 0x5],
        'O' => [0x2, 0x5, 0x5, 0x5, 0x2],
        'P' => [0x6, 0x5, 0x6, 0x4, 0x4],
        'Q' => [0x2, 0x5, 0x5, 0x6, 0x3],
        'R' => [0x6, 0x5, 0x6, 0x5, 0x5],
        'S' => [0x3, 0x4, 0x2, 0x1, 0x6],
        'T' => [0x7, 0x2, 0x2, 0x2, 0x2],
        'U' => [0x5, 0x5, 0x5, 0x5, 0x7],
        'V' => [0x5, 0x5, 0x5, 0x5, 0x2],
        'W' => [0x5, 0x5, 0x7, 0x7, 0x5],
        'X' => [0x5, 0x5, 0x2, 0x5, 0x5],
        'Y' => [0x5, 0x5, 0x2, 0x2, 0x2],
        'Z' => [0x7, 0x1, 0x2, 0x4, 0x7],
        ' ' => [0x0, 0x0, 0x0, 0x0, 0x0],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        ',' => [0x0, 0x0, 0x0, 0x2, 0x4],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        '_' => [0x0, 0x0, 0x0, 0x0, 0x7],
        '/' => [0x1, 0x1, 0x2, 0x4, 0x4],
        '(' => [0x2, 0x4, 0x4, 0x4, 0x2],
        ')' => [0x2, 0x1, 0x1, 0x1, 0x2],
        '[' => [0x7, 0x4, 0x4, 0x4, 0x7],
        ']' => [0x7, 0x1, 0x1, 0x1, 0x7],
        _ => [0x7, 0x7, 0x7, 0x7, 0x7],
    }
}

/// Advance per character: glyph plus one column of spacing.
pub fn char_advance(scale: u32) -> u32 {
    (GLYPH_W + 1) * scale
}

pub fn line_height(scale: u32) -> u32 {
    (GLYPH_H + 2) * scale
}

pub fn measure_text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * char_advance(scale)
}

/// Pixels outside the image are clipped.
pub fn draw_text(image: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>, scale: u32) {
    let mut cx = x;
    for c in text.chars() {
        draw_char(image, cx, y, c, color, scale);
        cx = cx.saturating_add(char_advance(scale));
    }
}

fn draw_char(image: &mut RgbImage, x: u32, y: u32, c: char, color: Rgb<u8>, scale: u32) {
    let (width, height) = image.dimensions();
    for (row, bits) in glyph(c).iter().enumerate() {
        for col in 0..GLYPH_W {
            if (bits >> (GLYPH_W - 1 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x.saturating_add(col * scale + dx);
                    let py = y.saturating_add(row as u32 * scale + dy);
                    if px < width && py < height {
                        image.put_pixel(px, py, color);
                    }
                }
            }
        }
    }
}

/// Solid box behind a text line so it stays readable on bright frames.
pub fn fill_rect(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    for py in y..y.saturating_add(h).min(height) {
        for px in x..x.saturating_add(w).min(width) {
            image.put_pixel(px, py, color);
        }
    }
}
