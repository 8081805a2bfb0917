//! Glyph rendering on top of a [`Canvas`].
//!
//! The single-glyph functions only set pixels. The multi-glyph helpers
//! (`draw_text`, `draw_text_2x2`, `draw_time`) own the whole frame: they
//! clear first and commit exactly once at the end.

use crate::font::{FONT_5X7, GLYPH_WIDTH, glyph_code};
use crate::matrix::Canvas;

/// Horizontal advance for a glyph in `draw_text`.
pub const GLYPH_ADVANCE: i32 = 6;
/// Horizontal advance for a space in `draw_text`.
pub const SPACE_ADVANCE: i32 = 4;

/// Left/right and top/bottom origins of the four 2×2 quadrants.
const QUADRANT_X: [i32; 2] = [2, 9];
const QUADRANT_Y: [i32; 2] = [0, 9];

/// Draw glyph `code` (0–9 digits, 10+ letters) with its top-left at `(x, y)`.
///
/// Returns `false` and draws nothing for codes outside the font.
pub fn draw_glyph<C: Canvas + ?Sized>(canvas: &mut C, code: u8, x: i32, y: i32) -> bool {
    let Some(rows) = FONT_5X7.get(usize::from(code)) else {
        return false;
    };
    for (dy, &line) in rows.iter().enumerate() {
        for dx in 0..GLYPH_WIDTH {
            if line & (1 << (GLYPH_WIDTH - 1 - dx)) != 0 {
                // Saturated offsets land off-panel and are dropped.
                canvas.set_pixel(x.saturating_add(dx as i32), y.saturating_add(dy as i32), true);
            }
        }
    }
    true
}

/// Draw a single decimal digit. Anything above 9 is skipped.
pub fn draw_digit<C: Canvas + ?Sized>(canvas: &mut C, digit: u8, x: i32, y: i32) -> bool {
    if digit > 9 {
        return false;
    }
    draw_glyph(canvas, digit, x, y)
}

/// One line of text starting near the top-left corner.
///
/// Unknown characters are skipped without advancing.
pub fn draw_text<C: Canvas + ?Sized>(canvas: &mut C, text: &str) {
    canvas.clear();
    let mut x = 1;
    let y = 2;
    for c in text.chars() {
        if c == ' ' {
            x += SPACE_ADVANCE;
        } else if let Some(code) = glyph_code(c) {
            draw_glyph(canvas, code, x, y);
            x += GLYPH_ADVANCE;
        }
    }
    canvas.render();
}

/// Up to four characters, one per quadrant: top-left, top-right,
/// bottom-left, bottom-right.
pub fn draw_text_2x2<C: Canvas + ?Sized>(canvas: &mut C, text: &str) {
    canvas.clear();
    for (i, c) in text.chars().take(4).enumerate() {
        if let Some(code) = glyph_code(c) {
            draw_glyph(canvas, code, QUADRANT_X[i % 2], QUADRANT_Y[i / 2]);
        }
    }
    canvas.render();
}

/// Two digits in the top half and two in the bottom half.
pub fn draw_two_rows<C: Canvas + ?Sized>(canvas: &mut C, top: u8, bottom: u8) {
    draw_digit(canvas, top / 10 % 10, QUADRANT_X[0], QUADRANT_Y[0]);
    draw_digit(canvas, top % 10, QUADRANT_X[1], QUADRANT_Y[0]);
    draw_digit(canvas, bottom / 10 % 10, QUADRANT_X[0], QUADRANT_Y[1]);
    draw_digit(canvas, bottom % 10, QUADRANT_X[1], QUADRANT_Y[1]);
}

/// Hours over minutes.
pub fn draw_time<C: Canvas + ?Sized>(canvas: &mut C, hour: u8, minute: u8) {
    canvas.clear();
    draw_two_rows(canvas, hour, minute);
    canvas.render();
}

/// Number of pixels glyph `code` lights, or 0 for unknown codes.
pub fn glyph_pixel_count(code: u8) -> usize {
    FONT_5X7
        .get(usize::from(code))
        .map(|rows| rows.iter().map(|r| r.count_ones() as usize).sum())
        .unwrap_or(0)
}
