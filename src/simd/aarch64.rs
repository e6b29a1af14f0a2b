//! aarch64 squared-difference kernel using NEON.

use std::arch::aarch64::*;

use crate::simd::fallback;
use crate::simd::FLUSH_INTERVAL;

/// Sum of squared differences, 16 bytes per step.
///
/// # Safety
/// Caller must ensure NEON is available on the current CPU.
#[target_feature(enable = "neon")]
pub unsafe fn sum_squared_diff_neon(a: &[u8], b: &[u8], skip_alpha: bool) -> u64 {
    let len = a.len().min(b.len());
    let blocks = len / 16;

    let total: i64;
    // SAFETY: every load reads 16 bytes starting at `i * 16` with
    // `i < blocks = len / 16`, so it stays inside both slices.
    unsafe {
        let mask = if skip_alpha {
            vreinterpretq_s16_u64(vdupq_n_u64(0x0000_ffff_ffff_ffff))
        } else {
            vdupq_n_s16(-1)
        };
        let mut acc64 = vdupq_n_s64(0);

        let mut block = 0;
        while block < blocks {
            let end = (block + FLUSH_INTERVAL).min(blocks);
            let mut acc32 = vdupq_n_s32(0);

            for i in block..end {
                let va = vld1q_u8(a.as_ptr().add(i * 16));
                let vb = vld1q_u8(b.as_ptr().add(i * 16));

                // Wrapping u16 subtraction reinterpreted as i16 is the signed difference.
                let d_lo = vreinterpretq_s16_u16(vsubl_u8(vget_low_u8(va), vget_low_u8(vb)));
                let d_hi = vreinterpretq_s16_u16(vsubl_high_u8(va, vb));
                let d_lo = vandq_s16(d_lo, mask);
                let d_hi = vandq_s16(d_hi, mask);

                acc32 = vmlal_s16(acc32, vget_low_s16(d_lo), vget_low_s16(d_lo));
                acc32 = vmlal_high_s16(acc32, d_lo, d_lo);
                acc32 = vmlal_s16(acc32, vget_low_s16(d_hi), vget_low_s16(d_hi));
                acc32 = vmlal_high_s16(acc32, d_hi, d_hi);
            }

            acc64 = vpadalq_s32(acc64, acc32);
            block = end;
        }

        total = vaddvq_s64(acc64);
    }

    let tail = blocks * 16;
    total as u64 + fallback::sum_squared_diff(&a[tail..len], &b[tail..len], skip_alpha)
}
