//! PSNR engine: validation, alpha gating, kernel dispatch, and the final
//! decibel formula.
//!
//! ```text
//! MSE  = sum((a - b)^2) / (width * height * channels)
//! PSNR = 10 * log10(255^2 / MSE)
//! ```
//!
//! `channels` is 4 when sampled alpha is present in either image, 3 otherwise.
//! Identical images (a sum of exactly zero) score `f64::INFINITY`.

pub mod alpha;
pub mod kernel;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::{DecodedImage, PixelBuffer};
use crate::simd::{Backend, SampleMask};

pub use alpha::{detect_alpha, AlphaSampling};

/// Square of the peak 8-bit sample value.
pub const PEAK_SQUARED: f64 = 65025.0;

/// MSE scale applied when either image was decoded from JPEG.
///
/// JPEG decoders disagree slightly on reconstructed pixels (IDCT and color
/// conversion rounding). This factor was fit so results track the reference
/// toolkit's decoder. It is a property of that decoder discrepancy, not of
/// PSNR, and must stay the only copy of the value.
pub const JPEG_MSE_CORRECTION: f64 = 0.9005;

/// Options for a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsnrOptions {
    /// Alpha detection grid.
    pub alpha_sampling: AlphaSampling,
    /// Squared-difference implementation for the packed and planar kernels.
    pub backend: Backend,
}

impl Default for PsnrOptions {
    fn default() -> Self {
        Self {
            alpha_sampling: AlphaSampling::DEFAULT,
            backend: Backend::detect(),
        }
    }
}

impl PsnrOptions {
    /// Set the alpha detection grid.
    #[must_use]
    pub fn with_alpha_sampling(mut self, sampling: AlphaSampling) -> Self {
        self.alpha_sampling = sampling;
        self
    }

    /// Force a backend. Unavailable backends run the scalar loop.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }
}

/// Kernel chosen for an image pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// Per-coordinate access through the pixel abstraction.
    Generic,
    /// Raw packed RGBA8 rows.
    Packed,
    /// Planar YCbCr converted to RGB row by row.
    Planar,
}

/// Full result of one comparison.
///
/// Serialize-only: an infinite `psnr` is written as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsnrReport {
    /// PSNR in dB; `f64::INFINITY` for identical images.
    pub psnr: f64,
    /// Mean squared error that entered the formula, after any correction.
    pub mse: f64,
    /// Sum of squared channel differences.
    pub sum_squared_diff: u64,
    /// Number of channel samples, `width * height * channels`.
    pub samples: u64,
    /// Channels per pixel that took part (3 or 4).
    pub channels: u8,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Kernel that produced the sum.
    pub kernel: KernelKind,
    /// Backend used by the kernel; `None` for the generic kernel.
    pub backend: Option<Backend>,
    /// Whether [`JPEG_MSE_CORRECTION`] was applied.
    pub corrected: bool,
}

impl PsnrReport {
    /// Whether the images were identical under the metric.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.sum_squared_diff == 0
    }
}

/// Compare two decoded images.
pub fn compare_images(a: &DecodedImage, b: &DecodedImage, options: &PsnrOptions) -> Result<PsnrReport> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: a.dimensions(),
            actual: b.dimensions(),
        });
    }
    let (width, height) = a.dimensions();

    let has_alpha = (a.format().supports_alpha() || b.format().supports_alpha())
        && detect_alpha(a.pixels(), b.pixels(), &options.alpha_sampling);
    let channels: u8 = if has_alpha { 4 } else { 3 };

    let backend = options.backend;
    let (kernel, sum) = match (a.pixels(), b.pixels()) {
        (PixelBuffer::Rgba(pa), PixelBuffer::Rgba(pb))
        | (PixelBuffer::Nrgba(pa), PixelBuffer::Nrgba(pb)) => {
            (KernelKind::Packed, kernel::packed(pa, pb, has_alpha, backend))
        }
        (PixelBuffer::YCbCr(pa), PixelBuffer::YCbCr(pb)) => {
            (KernelKind::Planar, kernel::planar(pa, pb, backend))
        }
        (pa, pb) => (KernelKind::Generic, kernel::generic(pa, pb, has_alpha)),
    };

    let corrected = a.format().is_lossy() || b.format().is_lossy();
    let samples = (width as u64) * (height as u64) * u64::from(channels);
    let (mse, psnr) = score(sum, samples, corrected);

    log::debug!(
        "{}x{} {:?}/{:?}: kernel={:?} backend={} channels={} sum={} corrected={} psnr={:.4}",
        width,
        height,
        a.layout(),
        b.layout(),
        kernel,
        backend,
        channels,
        sum,
        corrected,
        psnr
    );

    Ok(PsnrReport {
        psnr,
        mse,
        sum_squared_diff: sum,
        samples,
        channels,
        width,
        height,
        kernel,
        backend: (kernel != KernelKind::Generic).then_some(backend),
        corrected,
    })
}

/// Turn an accumulated sum into `(mse, psnr)`.
///
/// A zero sum short-circuits to `(0.0, INFINITY)`.
#[must_use]
pub fn score(sum_squared_diff: u64, samples: u64, corrected: bool) -> (f64, f64) {
    if sum_squared_diff == 0 {
        return (0.0, f64::INFINITY);
    }
    let mut mse = sum_squared_diff as f64 / samples as f64;
    if corrected {
        mse *= JPEG_MSE_CORRECTION;
    }
    (mse, psnr_from_mse(mse))
}

/// `10 * log10(255^2 / mse)`, unclamped.
#[must_use]
pub fn psnr_from_mse(mse: f64) -> f64 {
    10.0 * (PEAK_SQUARED / mse).log10()
}

/// PSNR between two tightly packed RGB8 buffers.
///
/// Three channels, no correction, the detected backend.
pub fn psnr_rgb8(reference: &[u8], test: &[u8], width: usize, height: usize) -> Result<f64> {
    let expected = width * height * 3;
    for (name, buf) in [("reference", reference), ("test", test)] {
        if buf.len() != expected {
            return Err(Error::InvalidBuffer(format!(
                "{} has {} bytes, expected {} for {}x{} RGB8",
                name,
                buf.len(),
                expected,
                width,
                height
            )));
        }
    }

    let sum = Backend::detect().sum_squared_diff(reference, test, SampleMask::All);
    Ok(score(sum, expected as u64, false).1)
}
