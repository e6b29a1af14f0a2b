//! x86_64 squared-difference kernels using SSE2 and AVX2.

use std::arch::x86_64::*;

use crate::simd::fallback;
use crate::simd::FLUSH_INTERVAL;

/// Keeps the low three 16-bit lanes of every 64-bit group, zeroing the alpha slot.
const RGB_LANES: i64 = 0x0000_ffff_ffff_ffff;

/// Sum of squared differences, 32 bytes per step.
///
/// # Safety
/// Caller must ensure AVX2 is available on the current CPU.
#[target_feature(enable = "avx2")]
pub unsafe fn sum_squared_diff_avx2(a: &[u8], b: &[u8], skip_alpha: bool) -> u64 {
    let len = a.len().min(b.len());
    let blocks = len / 32;

    let mut lanes = [0u64; 4];
    // SAFETY: every load reads 32 bytes starting at `i * 32` with
    // `i < blocks = len / 32`, so it stays inside both slices.
    unsafe {
        let zero = _mm256_setzero_si256();
        let mask = if skip_alpha {
            _mm256_set1_epi64x(RGB_LANES)
        } else {
            _mm256_set1_epi8(-1)
        };
        let mut acc64 = _mm256_setzero_si256();

        let mut block = 0;
        while block < blocks {
            let end = (block + FLUSH_INTERVAL).min(blocks);
            let mut acc32 = _mm256_setzero_si256();

            for i in block..end {
                let va = _mm256_loadu_si256(a.as_ptr().add(i * 32).cast::<__m256i>());
                let vb = _mm256_loadu_si256(b.as_ptr().add(i * 32).cast::<__m256i>());

                // Widen to i16 before subtracting; |diff| <= 255.
                let d_lo = _mm256_sub_epi16(
                    _mm256_unpacklo_epi8(va, zero),
                    _mm256_unpacklo_epi8(vb, zero),
                );
                let d_hi = _mm256_sub_epi16(
                    _mm256_unpackhi_epi8(va, zero),
                    _mm256_unpackhi_epi8(vb, zero),
                );
                let d_lo = _mm256_and_si256(d_lo, mask);
                let d_hi = _mm256_and_si256(d_hi, mask);

                // madd squares and pair-adds into i32: at most 2 * 65025 per lane.
                acc32 = _mm256_add_epi32(acc32, _mm256_madd_epi16(d_lo, d_lo));
                acc32 = _mm256_add_epi32(acc32, _mm256_madd_epi16(d_hi, d_hi));
            }

            // Lanes are non-negative, so zero-extension widens them correctly.
            acc64 = _mm256_add_epi64(acc64, _mm256_unpacklo_epi32(acc32, zero));
            acc64 = _mm256_add_epi64(acc64, _mm256_unpackhi_epi32(acc32, zero));
            block = end;
        }

        _mm256_storeu_si256(lanes.as_mut_ptr().cast::<__m256i>(), acc64);
    }

    let tail = blocks * 32;
    lanes.iter().sum::<u64>() + fallback::sum_squared_diff(&a[tail..len], &b[tail..len], skip_alpha)
}

/// Sum of squared differences, 16 bytes per step.
///
/// # Safety
/// Caller must ensure SSE2 is available on the current CPU.
#[target_feature(enable = "sse2")]
pub unsafe fn sum_squared_diff_sse2(a: &[u8], b: &[u8], skip_alpha: bool) -> u64 {
    let len = a.len().min(b.len());
    let blocks = len / 16;

    let mut lanes = [0u64; 2];
    // SAFETY: every load reads 16 bytes starting at `i * 16` with
    // `i < blocks = len / 16`, so it stays inside both slices.
    unsafe {
        let zero = _mm_setzero_si128();
        let mask = if skip_alpha {
            _mm_set1_epi64x(RGB_LANES)
        } else {
            _mm_set1_epi8(-1)
        };
        let mut acc64 = _mm_setzero_si128();

        let mut block = 0;
        while block < blocks {
            let end = (block + FLUSH_INTERVAL).min(blocks);
            let mut acc32 = _mm_setzero_si128();

            for i in block..end {
                let va = _mm_loadu_si128(a.as_ptr().add(i * 16).cast::<__m128i>());
                let vb = _mm_loadu_si128(b.as_ptr().add(i * 16).cast::<__m128i>());

                let d_lo = _mm_sub_epi16(_mm_unpacklo_epi8(va, zero), _mm_unpacklo_epi8(vb, zero));
                let d_hi = _mm_sub_epi16(_mm_unpackhi_epi8(va, zero), _mm_unpackhi_epi8(vb, zero));
                let d_lo = _mm_and_si128(d_lo, mask);
                let d_hi = _mm_and_si128(d_hi, mask);

                acc32 = _mm_add_epi32(acc32, _mm_madd_epi16(d_lo, d_lo));
                acc32 = _mm_add_epi32(acc32, _mm_madd_epi16(d_hi, d_hi));
            }

            acc64 = _mm_add_epi64(acc64, _mm_unpacklo_epi32(acc32, zero));
            acc64 = _mm_add_epi64(acc64, _mm_unpackhi_epi32(acc32, zero));
            block = end;
        }

        _mm_storeu_si128(lanes.as_mut_ptr().cast::<__m128i>(), acc64);
    }

    let tail = blocks * 16;
    lanes.iter().sum::<u64>() + fallback::sum_squared_diff(&a[tail..len], &b[tail..len], skip_alpha)
}
