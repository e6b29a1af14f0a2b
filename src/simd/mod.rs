//! Squared-difference kernels over raw byte ranges.
//!
//! One capability, several implementations: sum `(a[i] - b[i])^2` over two
//! byte ranges, optionally skipping every fourth byte (the alpha slot of
//! packed RGBA). [`Backend`] names an implementation; [`Backend::detect`]
//! checks the CPU once and caches the fastest available one.
//!
//! All backends accumulate in integers and must return identical sums. The
//! vector backends square into 32-bit lanes and flush those into 64-bit lanes
//! every [`FLUSH_INTERVAL`] steps, well before a lane could overflow.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub mod fallback;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[allow(unsafe_code)]
pub mod x86_64;

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
#[allow(unsafe_code)]
pub mod aarch64;

/// Vector steps between 32-bit to 64-bit lane flushes.
///
/// A step adds at most `4 * 65025` to a 32-bit lane, so 4096 steps stay
/// below `i32::MAX`.
pub const FLUSH_INTERVAL: usize = 4096;

/// Which bytes of a range take part in the sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleMask {
    /// Every byte.
    All,
    /// Skip bytes at index `3 (mod 4)`; the alpha slot of packed RGBA.
    SkipAlpha,
}

impl SampleMask {
    /// Mask for packed RGBA data given whether alpha participates.
    #[must_use]
    pub fn for_alpha(has_alpha: bool) -> Self {
        if has_alpha { Self::All } else { Self::SkipAlpha }
    }

    fn skip_alpha(self) -> bool {
        matches!(self, Self::SkipAlpha)
    }
}

/// An implementation of the squared-difference kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Portable scalar loop.
    Scalar,
    /// x86_64 SSE2, 16 bytes per step.
    Sse2,
    /// x86_64 AVX2, 32 bytes per step.
    Avx2,
    /// aarch64 NEON, 16 bytes per step.
    Neon,
}

impl Backend {
    /// Every backend, fastest first.
    pub const ALL: [Backend; 4] = [Backend::Avx2, Backend::Neon, Backend::Sse2, Backend::Scalar];

    /// Fastest backend the current CPU supports, detected once per process.
    pub fn detect() -> Self {
        static DETECTED: OnceLock<Backend> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            let backend = Self::ALL
                .into_iter()
                .find(|b| b.is_available())
                .unwrap_or(Self::Scalar);
            log::debug!("squared-difference backend: {}", backend);
            backend
        })
    }

    /// Backends usable on this CPU with this build, fastest first.
    pub fn available() -> Vec<Self> {
        Self::ALL.into_iter().filter(|b| b.is_available()).collect()
    }

    /// Whether this backend can run here.
    pub fn is_available(self) -> bool {
        match self {
            Self::Scalar => true,
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Sse2 => is_x86_feature_detected!("sse2"),
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Avx2 => is_x86_feature_detected!("avx2"),
            #[cfg(all(feature = "simd", target_arch = "aarch64"))]
            Self::Neon => std::arch::is_aarch64_feature_detected!("neon"),
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    /// Sum of squared differences over the common prefix of `a` and `b`.
    ///
    /// A backend that is not available here runs the scalar loop instead.
    #[must_use]
    #[cfg_attr(feature = "simd", allow(unsafe_code))]
    pub fn sum_squared_diff(self, a: &[u8], b: &[u8], mask: SampleMask) -> u64 {
        debug_assert_eq!(a.len(), b.len());
        let skip_alpha = mask.skip_alpha();

        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if self == Self::Avx2 && is_x86_feature_detected!("avx2") {
                // SAFETY: AVX2 support was just checked.
                return unsafe { x86_64::sum_squared_diff_avx2(a, b, skip_alpha) };
            }
            if self == Self::Sse2 && is_x86_feature_detected!("sse2") {
                // SAFETY: SSE2 support was just checked.
                return unsafe { x86_64::sum_squared_diff_sse2(a, b, skip_alpha) };
            }
        }

        #[cfg(all(feature = "simd", target_arch = "aarch64"))]
        {
            if self == Self::Neon && std::arch::is_aarch64_feature_detected!("neon") {
                // SAFETY: NEON support was just checked.
                return unsafe { aarch64::sum_squared_diff_neon(a, b, skip_alpha) };
            }
        }

        fallback::sum_squared_diff(a, b, skip_alpha)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Sse2 => write!(f, "sse2"),
            Self::Avx2 => write!(f, "avx2"),
            Self::Neon => write!(f, "neon"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_always_available() {
        assert!(Backend::Scalar.is_available());
        assert!(Backend::available().contains(&Backend::Scalar));
        assert_eq!(Backend::available().last(), Some(&Backend::Scalar));
    }

    #[test]
    fn test_detect_is_stable_and_available() {
        let first = Backend::detect();
        assert_eq!(first, Backend::detect());
        assert!(first.is_available());
    }

    #[test]
    fn test_unavailable_backend_falls_back_to_scalar() {
        let a: Vec<u8> = (0..100).map(|i| i as u8).collect();
        let b: Vec<u8> = (0..100).map(|i| (i * 3) as u8).collect();
        let expected = fallback::sum_squared_diff(&a, &b, false);
        for backend in Backend::ALL {
            assert_eq!(backend.sum_squared_diff(&a, &b, SampleMask::All), expected);
        }
    }

    #[test]
    fn test_mask_for_alpha() {
        assert_eq!(SampleMask::for_alpha(true), SampleMask::All);
        assert_eq!(SampleMask::for_alpha(false), SampleMask::SkipAlpha);
    }
}
