//! Scalar implementation of the squared-difference kernel.
//!
//! Every vectorized backend finishes its tail with these functions, and the
//! equivalence tests use them as the reference result.

/// Squared difference of two 8-bit samples.
#[inline]
#[must_use]
pub fn squared_diff(a: u8, b: u8) -> u64 {
    let d = i32::from(a) - i32::from(b);
    (d * d) as u64
}

/// Sum of squared differences over two byte ranges.
///
/// With `skip_alpha`, bytes whose index is `3 (mod 4)` are excluded, which
/// drops the alpha slot of packed RGBA data. Only the common prefix of the
/// two slices is compared.
#[must_use]
pub fn sum_squared_diff(a: &[u8], b: &[u8], skip_alpha: bool) -> u64 {
    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);

    if skip_alpha {
        a.chunks(4)
            .zip(b.chunks(4))
            .map(|(pa, pb)| {
                pa.iter()
                    .zip(pb)
                    .take(3)
                    .map(|(&x, &y)| squared_diff(x, y))
                    .sum::<u64>()
            })
            .sum()
    } else {
        a.iter().zip(b).map(|(&x, &y)| squared_diff(x, y)).sum()
    }
}
