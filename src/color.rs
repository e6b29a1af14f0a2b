//! Luma/chroma to RGB conversion.
//!
//! JFIF full-range YCbCr, evaluated in 16.16 fixed point:
//!
//! ```text
//! R = Y + 1.40200 * (Cr - 128)
//! G = Y - 0.34414 * (Cb - 128) - 0.71414 * (Cr - 128)
//! B = Y + 1.77200 * (Cb - 128)
//! ```
//!
//! Luma is scaled by `0x10101` rather than `0x10000` so that `Y = 255` with
//! neutral chroma maps exactly to 255 after the shift.

const CR_TO_R: i32 = 91881;
const CB_TO_G: i32 = 22554;
const CR_TO_G: i32 = 46802;
const CB_TO_B: i32 = 116130;

/// Convert one full-range YCbCr triple to RGB.
#[inline]
#[must_use]
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let yy = i32::from(y) * 0x10101;
    let cb = i32::from(cb) - 128;
    let cr = i32::from(cr) - 128;

    let r = yy + CR_TO_R * cr;
    let g = yy - CB_TO_G * cb - CR_TO_G * cr;
    let b = yy + CB_TO_B * cb;

    [clamp_fixed(r), clamp_fixed(g), clamp_fixed(b)]
}

/// Convert a row of YCbCr triples, writing interleaved RGB into `out`.
///
/// Conversion stops at whichever of `pixels` or `out` runs out first.
pub fn ycbcr_row_to_rgb(pixels: impl Iterator<Item = [u8; 3]>, out: &mut [u8]) {
    for (ycc, rgb) in pixels.zip(out.chunks_exact_mut(3)) {
        rgb.copy_from_slice(&ycbcr_to_rgb(ycc[0], ycc[1], ycc[2]));
    }
}

#[inline]
fn clamp_fixed(v: i32) -> u8 {
    (v >> 16).clamp(0, 255) as u8
}
