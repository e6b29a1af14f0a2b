//! Error types for PSNR computation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fast-psnr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing PSNR.
///
/// Every error is terminal for the call that produced it. No error is ever
/// converted into a default score.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An input is not a well-formed image of a supported format.
    #[error("Decode failed ({codec}): {message}")]
    Decode {
        /// Decoder that rejected the input.
        codec: String,
        /// Error message from the decoder.
        message: String,
    },

    /// Image dimensions don't match between the two images.
    #[error(
        "images have different dimensions: {}x{} vs {}x{}",
        .expected.0, .expected.1, .actual.0, .actual.1
    )]
    DimensionMismatch {
        /// Dimensions of the first image (width, height).
        expected: (usize, usize),
        /// Dimensions of the second image (width, height).
        actual: (usize, usize),
    },

    /// Failed to read an image file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Unsupported image format or pixel format.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A pixel buffer is inconsistent with the dimensions it claims.
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),
}

impl Error {
    pub(crate) fn decode(codec: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            codec: codec.to_string(),
            message: message.into(),
        }
    }
}
