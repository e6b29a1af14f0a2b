//! Accumulation kernels: sum of squared per-channel differences.
//!
//! Differences are taken in `i32` and squared into `u64`, never in floating
//! point, so every kernel yields the exact same integer for the same samples.

use imgref::ImgVec;
use rgb::{ComponentBytes, RGBA8};

use crate::image::{PixelBuffer, YCbCrImage};
use crate::simd::{fallback::squared_diff, Backend, SampleMask};

/// Per-coordinate kernel for any pair of layouts.
///
/// Reads channels through [`PixelBuffer::rgba16_at`] and drops the low byte.
/// Alpha is included only when `has_alpha` is set.
#[must_use]
pub fn generic(a: &PixelBuffer, b: &PixelBuffer, has_alpha: bool) -> u64 {
    let mut sum = 0u64;
    for y in 0..a.height() {
        for x in 0..a.width() {
            let pa = a.rgba16_at(x, y);
            let pb = b.rgba16_at(x, y);

            sum += squared_diff((pa[0] >> 8) as u8, (pb[0] >> 8) as u8)
                + squared_diff((pa[1] >> 8) as u8, (pb[1] >> 8) as u8)
                + squared_diff((pa[2] >> 8) as u8, (pb[2] >> 8) as u8);

            if has_alpha {
                sum += squared_diff((pa[3] >> 8) as u8, (pb[3] >> 8) as u8);
            }
        }
    }
    sum
}

/// Kernel for two packed RGBA8 buffers of the same alpha convention.
///
/// Rows are handed to `backend` as raw bytes.
#[must_use]
pub fn packed(a: &ImgVec<RGBA8>, b: &ImgVec<RGBA8>, has_alpha: bool, backend: Backend) -> u64 {
    let mask = SampleMask::for_alpha(has_alpha);
    a.as_ref()
        .rows()
        .zip(b.as_ref().rows())
        .map(|(ra, rb)| backend.sum_squared_diff(ra.as_bytes(), rb.as_bytes(), mask))
        .sum()
}

/// Kernel for two planar YCbCr images.
///
/// Each row is converted to RGB first; chroma subsampling may differ between
/// the two images, so the planes themselves are never compared directly.
#[must_use]
pub fn planar(a: &YCbCrImage, b: &YCbCrImage, backend: Backend) -> u64 {
    let row_len = a.width() * 3;
    let mut row_a = vec![0u8; row_len];
    let mut row_b = vec![0u8; row_len];

    let mut sum = 0u64;
    for y in 0..a.height() {
        a.row_to_rgb(y, &mut row_a);
        b.row_to_rgb(y, &mut row_b);
        sum += backend.sum_squared_diff(&row_a, &row_b, SampleMask::All);
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ChromaSubsampling, DecodedImage, SourceFormat, YCbCrPlanes};

    fn rgba_pair(width: usize, height: usize) -> (DecodedImage, DecodedImage) {
        let a: Vec<u8> = (0..width * height * 4).map(|i| (i * 31 % 256) as u8).collect();
        let b: Vec<u8> = (0..width * height * 4).map(|i| (i * 17 % 256) as u8).collect();
        (
            DecodedImage::from_rgba8(&a, width, height, SourceFormat::Png).unwrap(),
            DecodedImage::from_rgba8(&b, width, height, SourceFormat::Png).unwrap(),
        )
    }

    fn packed_of(img: &DecodedImage) -> &ImgVec<RGBA8> {
        match img.pixels() {
            PixelBuffer::Rgba(p) | PixelBuffer::Nrgba(p) => p,
            other => panic!("expected packed buffer, got {:?}", other.layout()),
        }
    }

    #[test]
    fn test_generic_counts_alpha_only_when_asked() {
        let a = DecodedImage::from_rgba8(&[10, 10, 10, 255], 1, 1, SourceFormat::Png).unwrap();
        let b = DecodedImage::from_rgba8(&[13, 6, 10, 0], 1, 1, SourceFormat::Png).unwrap();
        assert_eq!(generic(a.pixels(), b.pixels(), false), 9 + 16);
        assert_eq!(generic(a.pixels(), b.pixels(), true), 9 + 16 + 65025);
    }

    #[test]
    fn test_packed_matches_generic() {
        let (a, b) = rgba_pair(37, 11);
        for has_alpha in [false, true] {
            let expected = generic(a.pixels(), b.pixels(), has_alpha);
            for backend in Backend::available() {
                let actual = packed(packed_of(&a), packed_of(&b), has_alpha, backend);
                assert_eq!(expected, actual, "backend={backend} has_alpha={has_alpha}");
            }
        }
    }

    #[test]
    fn test_planar_matches_generic() {
        let (width, height) = (19, 9);
        let (cw, ch) = ChromaSubsampling::Yuv420.chroma_dimensions(width, height);
        let sub = YCbCrImage::new(
            width,
            height,
            ChromaSubsampling::Yuv420,
            YCbCrPlanes {
                y: (0..width * height).map(|i| (i * 7 % 256) as u8).collect(),
                cb: (0..cw * ch).map(|i| (90 + i * 3 % 80) as u8).collect(),
                cr: (0..cw * ch).map(|i| (200 - i * 5 % 120) as u8).collect(),
                y_stride: width,
                c_stride: cw,
            },
        )
        .unwrap();
        let full: Vec<u8> = (0..width * height * 3).map(|i| (i * 11 % 256) as u8).collect();
        let full = YCbCrImage::from_interleaved(width, height, &full).unwrap();

        let pa = PixelBuffer::YCbCr(sub.clone());
        let pb = PixelBuffer::YCbCr(full.clone());
        let expected = generic(&pa, &pb, false);
        assert!(expected > 0);
        for backend in Backend::available() {
            assert_eq!(planar(&sub, &full, backend), expected, "backend={backend}");
        }
    }

    #[test]
    fn test_identical_buffers_sum_to_zero() {
        let (a, _) = rgba_pair(64, 3);
        for backend in Backend::available() {
            assert_eq!(packed(packed_of(&a), packed_of(&a), true, backend), 0);
        }
    }
}
