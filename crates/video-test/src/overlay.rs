//! Wall-clock timestamp burned into the luma plane.
//!
//! The token is `sssmm`: the last three digits of the Unix second followed by
//! centiseconds, i.e. `unix_millis / 10 mod 100000`. Each digit is drawn from
//! a 5x3 bitmap font scaled by [`BRUSH`] on a dark plate so it stays legible
//! over any bar. Only luma is touched; chroma keeps the base values.

use crate::PlaneLayout;
use time::OffsetDateTime;

/// Number of digits in the token.
pub const DIGITS: usize = 5;
/// Side of the square block one glyph cell expands to.
pub const BRUSH: usize = 4;
/// Top-left corner of the first glyph.
pub const ORIGIN: (usize, usize) = (16, 16);
/// Luma of glyph strokes.
pub const INK: u8 = 235;
/// Luma of the backing plate.
pub const PLATE: u8 = 16;

const GLYPH_ROWS: usize = 5;
const GLYPH_COLS: usize = 3;
/// Horizontal distance between glyph origins: three cells plus one cell of spacing.
const PITCH: usize = (GLYPH_COLS + 1) * BRUSH;

/// 5x3 font, one 3-bit mask per row, most significant bit on the left.
const GLYPHS: [[u8; GLYPH_ROWS]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Split `now` into the five token digits, most significant first.
pub fn timestamp_digits(now: OffsetDateTime) -> [u8; DIGITS] {
    let millis = now.unix_timestamp_nanos().div_euclid(1_000_000);
    let mut token = millis.div_euclid(10).rem_euclid(100_000);
    let mut digits = [0u8; DIGITS];
    for d in digits.iter_mut().rev() {
        *d = (token % 10) as u8;
        token /= 10;
    }
    digits
}

/// Numeric value of a digit token.
pub fn token_value(digits: &[u8; DIGITS]) -> u32 {
    digits.iter().fold(0, |acc, &d| acc * 10 + u32::from(d))
}

/// Pixel rectangle `(x, y, width, height)` covered by the plate.
pub fn plate_rect() -> (usize, usize, usize, usize) {
    let (ox, oy) = ORIGIN;
    let width = (DIGITS - 1) * PITCH + GLYPH_COLS * BRUSH + 2 * BRUSH;
    let height = GLYPH_ROWS * BRUSH + 2 * BRUSH;
    (ox - BRUSH, oy - BRUSH, width, height)
}

/// Draw `digits` into `luma`. Writes are clipped to the plane.
pub fn stamp(luma: &mut [u8], layout: &PlaneLayout, digits: &[u8; DIGITS]) {
    let (px, py, pw, ph) = plate_rect();
    fill(luma, layout, px, py, pw, ph, PLATE);

    let (ox, oy) = ORIGIN;
    for (i, &digit) in digits.iter().enumerate() {
        let glyph = &GLYPHS[usize::from(digit % 10)];
        let gx = ox + i * PITCH;
        for (row, mask) in glyph.iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if mask & (0b100 >> col) != 0 {
                    let x = gx + col * BRUSH;
                    let y = oy + row * BRUSH;
                    fill(luma, layout, x, y, BRUSH, BRUSH, INK);
                }
            }
        }
    }
}

/// Recover the digits drawn by [`stamp`] by sampling the center of every
/// glyph cell. Returns `None` if the region is clipped or a glyph is unknown.
pub fn read_digits(luma: &[u8], layout: &PlaneLayout) -> Option<[u8; DIGITS]> {
    let (px, py, pw, ph) = plate_rect();
    if px + pw > layout.width() || py + ph > layout.height() {
        return None;
    }
    let threshold = (u16::from(INK) + u16::from(PLATE)) / 2;
    let (ox, oy) = ORIGIN;
    let mut digits = [0u8; DIGITS];
    for (i, out) in digits.iter_mut().enumerate() {
        let gx = ox + i * PITCH;
        let mut seen = [0u8; GLYPH_ROWS];
        for (row, mask) in seen.iter_mut().enumerate() {
            for col in 0..GLYPH_COLS {
                let x = gx + col * BRUSH + BRUSH / 2;
                let y = oy + row * BRUSH + BRUSH / 2;
                if u16::from(luma[layout.luma_index(x, y)]) > threshold {
                    *mask |= 0b100 >> col;
                }
            }
        }
        *out = GLYPHS.iter().position(|g| *g == seen)? as u8;
    }
    Some(digits)
}

fn fill(
    luma: &mut [u8],
    layout: &PlaneLayout,
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    value: u8,
) {
    let x_end = (x + w).min(layout.width());
    let y_end = (y + h).min(layout.height());
    if x >= x_end {
        return;
    }
    for row in y..y_end {
        let start = layout.luma_index(x, row);
        luma[start..start + (x_end - x)].fill(value);
    }
}
