//! Static color-bar and gray-ramp base image.

use crate::{PlaneLayout, Planes};

/// One palette entry: luma, blue-difference and red-difference.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ycbcr {
    pub y: u8,
    pub cb: u8,
    pub cr: u8,
}

impl Ycbcr {
    pub const fn new(y: u8, cb: u8, cr: u8) -> Self {
        Self { y, cb, cr }
    }

    /// Luma at 75% intensity, truncated.
    pub fn bar_luma(&self) -> u8 {
        (u16::from(self.y) * 75 / 100) as u8
    }
}

/// Bar palette, left to right: white, yellow, cyan, green, magenta, red, blue.
pub const COLOR_BARS: [Ycbcr; 7] = [
    Ycbcr::new(235, 128, 128),
    Ycbcr::new(210, 16, 146),
    Ycbcr::new(170, 166, 16),
    Ycbcr::new(145, 54, 34),
    Ycbcr::new(107, 202, 222),
    Ycbcr::new(82, 90, 240),
    Ycbcr::new(41, 240, 110),
];

/// Chroma value of gray.
pub const NEUTRAL_CHROMA: u8 = 128;

/// First row of the gradient region.
pub fn bars_end(layout: &PlaneLayout) -> usize {
    layout.height() * 3 / 4
}

/// Index into [`COLOR_BARS`] for column `x`.
#[inline]
pub fn bar_index(layout: &PlaneLayout, x: usize) -> usize {
    x * COLOR_BARS.len() / layout.width()
}

/// Gradient luma for column `x`.
#[inline]
pub fn ramp_luma(layout: &PlaneLayout, x: usize) -> u8 {
    (x * 255 / layout.width()) as u8
}

/// Render the base image: seven bars over the top three quarters, a
/// black-to-white ramp with neutral chroma below.
pub fn render_base(layout: &PlaneLayout) -> Planes {
    let mut planes = Planes::new(layout);
    let width = layout.width();
    let split = bars_end(layout);

    // Both columns of a pair write the shared chroma sample; the odd one lands last.
    for y in 0..split {
        let yi = layout.luma_index(0, y);
        for x in 0..width {
            let color = COLOR_BARS[bar_index(layout, x)];
            let ci = layout.chroma_index(x, y);
            planes.y[yi + x] = color.bar_luma();
            planes.cb[ci] = color.cb;
            planes.cr[ci] = color.cr;
        }
    }
    for y in split..layout.height() {
        let yi = layout.luma_index(0, y);
        for x in 0..width {
            let ci = layout.chroma_index(x, y);
            planes.y[yi + x] = ramp_luma(layout, x);
            planes.cb[ci] = NEUTRAL_CHROMA;
            planes.cr[ci] = NEUTRAL_CHROMA;
        }
    }
    planes
}
