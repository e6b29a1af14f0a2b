//! # fast-psnr
//!
//! Fast PSNR between two JPEG or PNG images, with integer accumulation and
//! runtime-selected SIMD kernels.
//!
//! Results are calibrated to track a widely used reference toolkit within a
//! small margin, not to match it bit for bit.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! let psnr = fast_psnr::compute_files("reference.png", "candidate.png")?;
//! if psnr.is_infinite() {
//!     println!("identical");
//! } else {
//!     println!("PSNR: {:.2} dB", psnr);
//! }
//! # Ok::<(), fast_psnr::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`image`]: Decoded image representation and pixel layouts
//! - [`color`]: YCbCr to RGB conversion
//! - [`decode`]: JPEG/PNG decoding
//! - [`psnr`]: Alpha detection, accumulation kernels, correction, formula
//! - [`simd`]: Squared-difference backends
//! - [`calculator`]: Configurable decode-and-compare front end

#![cfg_attr(not(feature = "simd"), forbid(unsafe_code))]

pub mod calculator;
pub mod color;
pub mod decode;
pub mod error;
pub mod image;
pub mod psnr;
pub mod simd;

use std::path::Path;

pub use calculator::PsnrCalculator;
pub use decode::{decode_image, DecodeFn};
pub use error::{Error, Result};
pub use crate::image::{
    ChromaSubsampling, DecodedImage, PixelBuffer, PixelLayout, SourceFormat, YCbCrImage, YCbCrPlanes,
};
pub use psnr::{
    compare_images, psnr_rgb8, AlphaSampling, KernelKind, PsnrOptions, PsnrReport, JPEG_MSE_CORRECTION,
};
pub use simd::Backend;

/// PSNR in dB between two encoded JPEG or PNG images.
///
/// Returns `f64::INFINITY` when the images are identical.
pub fn compute(a: &[u8], b: &[u8]) -> Result<f64> {
    PsnrCalculator::new().compute(a, b)
}

/// PSNR in dB between two JPEG or PNG files.
pub fn compute_files(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<f64> {
    PsnrCalculator::new().compute_files(a, b)
}
