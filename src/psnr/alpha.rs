//! Sparse alpha presence detection.
//!
//! Samples a regular grid instead of scanning every pixel. Alpha confined to
//! pixels between grid points goes unnoticed; the pair is then compared on
//! RGB only.

use serde::{Deserialize, Serialize};

use crate::image::PixelBuffer;

/// Grid spacing used by [`detect_alpha`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaSampling {
    /// Step used when either dimension is below `small_dimension`.
    pub dense_step: usize,
    /// Step used otherwise.
    pub sparse_step: usize,
    /// Dimension threshold separating small from large images.
    pub small_dimension: usize,
}

impl AlphaSampling {
    /// Default grid: every 4th pixel on images under 64 pixels in either
    /// direction, every 16th pixel otherwise.
    pub const DEFAULT: Self = Self {
        dense_step: 4,
        sparse_step: 16,
        small_dimension: 64,
    };

    /// Grid step for an image of `width` x `height`. Never zero.
    #[must_use]
    pub fn step_for(&self, width: usize, height: usize) -> usize {
        let step = if width < self.small_dimension || height < self.small_dimension {
            self.dense_step
        } else {
            self.sparse_step
        };
        step.max(1)
    }
}

impl Default for AlphaSampling {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether any sampled pixel of either image is not fully opaque.
///
/// Both buffers must have the same dimensions.
#[must_use]
pub fn detect_alpha(a: &PixelBuffer, b: &PixelBuffer, sampling: &AlphaSampling) -> bool {
    let (width, height) = (a.width(), a.height());
    let step = sampling.step_for(width, height);

    for y in (0..height).step_by(step) {
        for x in (0..width).step_by(step) {
            if a.rgba16_at(x, y)[3] != 0xffff || b.rgba16_at(x, y)[3] != 0xffff {
                log::trace!("non-opaque alpha sampled at ({}, {})", x, y);
                return true;
            }
        }
    }
    false
}
