//! Reusable PSNR calculator: a decoder plus comparison options.

use std::path::Path;

use crate::decode::{default_decoder, DecodeFn};
use crate::error::{Error, Result};
use crate::image::DecodedImage;
use crate::psnr::{compare_images, PsnrOptions, PsnrReport};

/// Decodes encoded image pairs and compares them.
///
/// ```no_run
/// use fast_psnr::{Backend, PsnrCalculator, PsnrOptions};
///
/// let calc = PsnrCalculator::with_options(PsnrOptions::default().with_backend(Backend::Scalar));
/// let report = calc.compare_files("reference.png", "candidate.jpg")?;
/// println!("{:.2} dB", report.psnr);
/// # Ok::<(), fast_psnr::Error>(())
/// ```
pub struct PsnrCalculator {
    options: PsnrOptions,
    decode: DecodeFn,
}

impl PsnrCalculator {
    /// Calculator with default options and the built-in JPEG/PNG decoder.
    pub fn new() -> Self {
        Self::with_options(PsnrOptions::default())
    }

    /// Calculator with the given options and the built-in decoder.
    pub fn with_options(options: PsnrOptions) -> Self {
        Self {
            options,
            decode: default_decoder(),
        }
    }

    /// Replace the decoder.
    #[must_use]
    pub fn with_decoder(mut self, decode: DecodeFn) -> Self {
        self.decode = decode;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &PsnrOptions {
        &self.options
    }

    /// Decode one encoded image.
    pub fn decode(&self, data: &[u8]) -> Result<DecodedImage> {
        (self.decode)(data)
    }

    /// Compare two already decoded images.
    pub fn compare(&self, a: &DecodedImage, b: &DecodedImage) -> Result<PsnrReport> {
        compare_images(a, b, &self.options)
    }

    /// Decode and compare two encoded images.
    ///
    /// The first decode error wins; nothing is compared unless both decode.
    pub fn compare_bytes(&self, a: &[u8], b: &[u8]) -> Result<PsnrReport> {
        let a = self.decode(a)?;
        let b = self.decode(b)?;
        self.compare(&a, &b)
    }

    /// Decode and compare two encoded images, returning only the PSNR.
    pub fn compute(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        self.compare_bytes(a, b).map(|r| r.psnr)
    }

    /// Read, decode and compare two image files.
    pub fn compare_files(&self, a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<PsnrReport> {
        let a = read_file(a.as_ref())?;
        let b = read_file(b.as_ref())?;
        self.compare_bytes(&a, &b)
    }

    /// Read, decode and compare two image files, returning only the PSNR.
    pub fn compute_files(&self, a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<f64> {
        self.compare_files(a, b).map(|r| r.psnr)
    }
}

impl Default for PsnrCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PsnrCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PsnrCalculator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    log::debug!("reading {}", path.display());
    std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::SourceFormat;
    use crate::simd::Backend;

    fn stub_decoder() -> DecodeFn {
        // One byte per image: its gray level. Everything else is rejected.
        Box::new(|data: &[u8]| match data {
            [level] => DecodedImage::from_gray8(vec![*level; 16], 4, 4, SourceFormat::Png),
            _ => Err(Error::decode("stub", "expected a single byte")),
        })
    }

    #[test]
    fn test_custom_decoder() {
        let calc = PsnrCalculator::new().with_decoder(stub_decoder());
        let psnr = calc.compute(&[100], &[110]).unwrap();
        assert!((psnr - 28.1308).abs() < 1e-3);
        assert!(calc.compute(&[7], &[7]).unwrap().is_infinite());
    }

    #[test]
    fn test_decode_error_propagates() {
        let calc = PsnrCalculator::new().with_decoder(stub_decoder());
        assert!(matches!(calc.compute(&[1, 2], &[1]), Err(Error::Decode { .. })));
        assert!(matches!(calc.compute(&[1], &[]), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let err = PsnrCalculator::new().compute_files(&missing, &missing).unwrap_err();
        match err {
            Error::Read { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_options_are_kept() {
        let calc = PsnrCalculator::with_options(PsnrOptions::default().with_backend(Backend::Scalar));
        assert_eq!(calc.options().backend, Backend::Scalar);
        assert!(format!("{calc:?}").contains("Scalar"));
    }
}
