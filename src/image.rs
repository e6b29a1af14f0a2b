//! Decoded image representation consumed by the PSNR engine.
//!
//! A [`DecodedImage`] pairs a [`PixelBuffer`] with the [`SourceFormat`] it was
//! decoded from. The buffer variant doubles as the layout tag the engine
//! dispatches on: packed 8-bit RGBA (premultiplied or straight), planar
//! YCbCr, and two layouts that only ever take the generic path.

use imgref::ImgVec;
use rgb::{RGBA16, RGBA8};
use serde::{Deserialize, Serialize};

use crate::color::ycbcr_to_rgb;
use crate::error::{Error, Result};

/// Codec family an image was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Lossy block-transform codec. Never carries alpha.
    Jpeg,
    /// Lossless palette/truecolor codec. May carry alpha.
    Png,
}

impl SourceFormat {
    /// Whether the codec discards information when encoding.
    #[must_use]
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }

    /// Whether images of this format can carry an alpha channel.
    #[must_use]
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png)
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
        }
    }
}

/// Native memory layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelLayout {
    /// Packed 8-bit RGBA, premultiplied alpha.
    Rgba,
    /// Packed 8-bit RGBA, straight (non-premultiplied) alpha.
    Nrgba,
    /// Planar 8-bit luma with two chroma planes.
    YCbCr,
    /// 8-bit luma only.
    Gray,
    /// Packed 16-bit RGBA, straight alpha.
    Rgba64,
}

/// Chroma plane resolution relative to the luma plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChromaSubsampling {
    /// Full-resolution chroma.
    #[default]
    Yuv444,
    /// Half horizontal chroma resolution.
    Yuv422,
    /// Half horizontal and half vertical chroma resolution.
    Yuv420,
    /// Half vertical chroma resolution.
    Yuv440,
}

impl ChromaSubsampling {
    /// Chroma plane dimensions for a luma plane of `width` x `height`.
    #[must_use]
    pub fn chroma_dimensions(self, width: usize, height: usize) -> (usize, usize) {
        match self {
            Self::Yuv444 => (width, height),
            Self::Yuv422 => (width.div_ceil(2), height),
            Self::Yuv420 => (width.div_ceil(2), height.div_ceil(2)),
            Self::Yuv440 => (width, height.div_ceil(2)),
        }
    }

    #[inline]
    fn chroma_index(self, x: usize, y: usize, stride: usize) -> usize {
        match self {
            Self::Yuv444 => y * stride + x,
            Self::Yuv422 => y * stride + x / 2,
            Self::Yuv420 => (y / 2) * stride + x / 2,
            Self::Yuv440 => (y / 2) * stride + x,
        }
    }
}

/// Planar YCbCr image with independently strided planes.
#[derive(Debug, Clone)]
pub struct YCbCrImage {
    y: Vec<u8>,
    cb: Vec<u8>,
    cr: Vec<u8>,
    y_stride: usize,
    c_stride: usize,
    width: usize,
    height: usize,
    subsampling: ChromaSubsampling,
}

/// Plane buffers and strides for [`YCbCrImage::new`].
#[derive(Debug, Clone, Default)]
pub struct YCbCrPlanes {
    /// Luma plane.
    pub y: Vec<u8>,
    /// Blue-difference chroma plane.
    pub cb: Vec<u8>,
    /// Red-difference chroma plane.
    pub cr: Vec<u8>,
    /// Distance in bytes between luma rows.
    pub y_stride: usize,
    /// Distance in bytes between chroma rows (shared by both chroma planes).
    pub c_stride: usize,
}

impl YCbCrImage {
    /// Wrap planes, checking every plane covers the image.
    pub fn new(
        width: usize,
        height: usize,
        subsampling: ChromaSubsampling,
        planes: YCbCrPlanes,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        let (cw, ch) = subsampling.chroma_dimensions(width, height);

        check_plane("luma", &planes.y, planes.y_stride, width, height)?;
        check_plane("cb", &planes.cb, planes.c_stride, cw, ch)?;
        check_plane("cr", &planes.cr, planes.c_stride, cw, ch)?;

        Ok(Self {
            y: planes.y,
            cb: planes.cb,
            cr: planes.cr,
            y_stride: planes.y_stride,
            c_stride: planes.c_stride,
            width,
            height,
            subsampling,
        })
    }

    /// Split tightly packed, interleaved 4:4:4 YCbCr triples into planes.
    pub fn from_interleaved(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        check_dimensions(width, height)?;
        let pixels = width * height;
        if data.len() != pixels * 3 {
            return Err(Error::InvalidBuffer(format!(
                "expected {} interleaved YCbCr bytes for {}x{}, got {}",
                pixels * 3,
                width,
                height,
                data.len()
            )));
        }

        let mut planes = YCbCrPlanes {
            y: Vec::with_capacity(pixels),
            cb: Vec::with_capacity(pixels),
            cr: Vec::with_capacity(pixels),
            y_stride: width,
            c_stride: width,
        };
        for ycc in data.chunks_exact(3) {
            planes.y.push(ycc[0]);
            planes.cb.push(ycc[1]);
            planes.cr.push(ycc[2]);
        }

        Self::new(width, height, ChromaSubsampling::Yuv444, planes)
    }

    /// Build a 4:4:4 image from rows laid out component by component.
    ///
    /// Each of the `height` rows is `3 * width` bytes: `width` luma samples,
    /// then `width` Cb samples, then `width` Cr samples.
    pub fn from_component_rows(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        check_dimensions(width, height)?;
        let pixels = width * height;
        if data.len() != pixels * 3 {
            return Err(Error::InvalidBuffer(format!(
                "expected {} component-row YCbCr bytes for {}x{}, got {}",
                pixels * 3,
                width,
                height,
                data.len()
            )));
        }

        let mut planes = YCbCrPlanes {
            y: Vec::with_capacity(pixels),
            cb: Vec::with_capacity(pixels),
            cr: Vec::with_capacity(pixels),
            y_stride: width,
            c_stride: width,
        };
        for row in data.chunks_exact(width * 3) {
            let (y, chroma) = row.split_at(width);
            let (cb, cr) = chroma.split_at(width);
            planes.y.extend_from_slice(y);
            planes.cb.extend_from_slice(cb);
            planes.cr.extend_from_slice(cr);
        }

        Self::new(width, height, ChromaSubsampling::Yuv444, planes)
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Chroma subsampling of the planes.
    #[must_use]
    pub fn subsampling(&self) -> ChromaSubsampling {
        self.subsampling
    }

    /// Raw `[Y, Cb, Cr]` sample for the pixel at (`x`, `y`).
    #[inline]
    #[must_use]
    pub fn ycbcr_at(&self, x: usize, y: usize) -> [u8; 3] {
        let ci = self.subsampling.chroma_index(x, y, self.c_stride);
        [self.y[y * self.y_stride + x], self.cb[ci], self.cr[ci]]
    }

    /// RGB value of the pixel at (`x`, `y`).
    #[inline]
    #[must_use]
    pub fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let [l, cb, cr] = self.ycbcr_at(x, y);
        ycbcr_to_rgb(l, cb, cr)
    }

    /// Convert row `y` to interleaved RGB. `out` must hold `3 * width` bytes.
    pub fn row_to_rgb(&self, y: usize, out: &mut [u8]) {
        debug_assert!(out.len() >= self.width * 3);
        crate::color::ycbcr_row_to_rgb((0..self.width).map(|x| self.ycbcr_at(x, y)), out);
    }
}

/// Pixel storage of a decoded image, one variant per supported layout.
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    /// Packed RGBA8, premultiplied alpha.
    Rgba(ImgVec<RGBA8>),
    /// Packed RGBA8, straight alpha.
    Nrgba(ImgVec<RGBA8>),
    /// Planar YCbCr.
    YCbCr(YCbCrImage),
    /// 8-bit grayscale.
    Gray(ImgVec<u8>),
    /// Packed RGBA16, straight alpha.
    Rgba64(ImgVec<RGBA16>),
}

impl PixelBuffer {
    /// Layout tag of this buffer.
    #[must_use]
    pub fn layout(&self) -> PixelLayout {
        match self {
            Self::Rgba(_) => PixelLayout::Rgba,
            Self::Nrgba(_) => PixelLayout::Nrgba,
            Self::YCbCr(_) => PixelLayout::YCbCr,
            Self::Gray(_) => PixelLayout::Gray,
            Self::Rgba64(_) => PixelLayout::Rgba64,
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Rgba(img) | Self::Nrgba(img) => img.width(),
            Self::YCbCr(img) => img.width(),
            Self::Gray(img) => img.width(),
            Self::Rgba64(img) => img.width(),
        }
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        match self {
            Self::Rgba(img) | Self::Nrgba(img) => img.height(),
            Self::YCbCr(img) => img.height(),
            Self::Gray(img) => img.height(),
            Self::Rgba64(img) => img.height(),
        }
    }

    /// Channels of the pixel at (`x`, `y`) widened to 16 bits.
    ///
    /// 8-bit samples are widened by replication (`v * 0x101`), so `>> 8`
    /// recovers them exactly. Values are reported in the buffer's own alpha
    /// convention; premultiplied and straight buffers are not converted into
    /// each other. Layouts without alpha report `0xffff`.
    #[inline]
    #[must_use]
    pub fn rgba16_at(&self, x: usize, y: usize) -> [u16; 4] {
        match self {
            Self::Rgba(img) | Self::Nrgba(img) => {
                let p = img.buf()[y * img.stride() + x];
                [widen(p.r), widen(p.g), widen(p.b), widen(p.a)]
            }
            Self::YCbCr(img) => {
                let [r, g, b] = img.rgb_at(x, y);
                [widen(r), widen(g), widen(b), 0xffff]
            }
            Self::Gray(img) => {
                let l = widen(img.buf()[y * img.stride() + x]);
                [l, l, l, 0xffff]
            }
            Self::Rgba64(img) => {
                let p = img.buf()[y * img.stride() + x];
                [p.r, p.g, p.b, p.a]
            }
        }
    }
}

#[inline]
fn widen(v: u8) -> u16 {
    u16::from(v) * 0x101
}

/// A decoded image together with the codec family it came from.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: PixelBuffer,
    format: SourceFormat,
}

impl DecodedImage {
    /// Wrap an already validated pixel buffer.
    #[must_use]
    pub fn new(pixels: PixelBuffer, format: SourceFormat) -> Self {
        Self { pixels, format }
    }

    /// Packed premultiplied RGBA8 from raw bytes (4 per pixel, no padding).
    pub fn from_rgba8(data: &[u8], width: usize, height: usize, format: SourceFormat) -> Result<Self> {
        let img = packed_rgba8(data, width, height)?;
        Ok(Self::new(PixelBuffer::Rgba(img), format))
    }

    /// Packed straight-alpha RGBA8 from raw bytes (4 per pixel, no padding).
    pub fn from_nrgba8(data: &[u8], width: usize, height: usize, format: SourceFormat) -> Result<Self> {
        let img = packed_rgba8(data, width, height)?;
        Ok(Self::new(PixelBuffer::Nrgba(img), format))
    }

    /// Opaque RGB8 bytes (3 per pixel) expanded into packed RGBA8.
    pub fn from_rgb8(data: &[u8], width: usize, height: usize, format: SourceFormat) -> Result<Self> {
        check_dimensions(width, height)?;
        check_len("RGB8", data.len(), width * height * 3)?;
        let pixels = data
            .chunks_exact(3)
            .map(|c| RGBA8::new(c[0], c[1], c[2], 255))
            .collect();
        Ok(Self::new(
            PixelBuffer::Rgba(ImgVec::new(pixels, width, height)),
            format,
        ))
    }

    /// 8-bit grayscale from raw bytes (1 per pixel, no padding).
    pub fn from_gray8(data: Vec<u8>, width: usize, height: usize, format: SourceFormat) -> Result<Self> {
        check_dimensions(width, height)?;
        check_len("gray", data.len(), width * height)?;
        Ok(Self::new(
            PixelBuffer::Gray(ImgVec::new(data, width, height)),
            format,
        ))
    }

    /// Pixel storage.
    #[must_use]
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Codec family this image was decoded from.
    #[must_use]
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Layout tag of the pixel storage.
    #[must_use]
    pub fn layout(&self) -> PixelLayout {
        self.pixels.layout()
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}

fn packed_rgba8(data: &[u8], width: usize, height: usize) -> Result<ImgVec<RGBA8>> {
    check_dimensions(width, height)?;
    check_len("RGBA8", data.len(), width * height * 4)?;
    let pixels = data
        .chunks_exact(4)
        .map(|c| RGBA8::new(c[0], c[1], c[2], c[3]))
        .collect();
    Ok(ImgVec::new(pixels, width, height))
}

fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidBuffer(format!(
            "image dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::InvalidBuffer(format!(
            "{} buffer has {} elements, expected {}",
            what, actual, expected
        )));
    }
    Ok(())
}

fn check_plane(name: &str, plane: &[u8], stride: usize, width: usize, height: usize) -> Result<()> {
    if stride < width {
        return Err(Error::InvalidBuffer(format!(
            "{} stride {} is smaller than plane width {}",
            name, stride, width
        )));
    }
    let needed = (height - 1) * stride + width;
    if plane.len() < needed {
        return Err(Error::InvalidBuffer(format!(
            "{} plane has {} bytes, needs at least {}",
            name,
            plane.len(),
            needed
        )));
    }
    Ok(())
}
