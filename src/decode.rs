//! Decoding of encoded JPEG and PNG bytes into [`DecodedImage`]s.
//!
//! The format is sniffed from magic bytes, never from a file extension.
//! Both decoders are behind cargo features (`jpeg-decode`, `png-decode`);
//! with a feature disabled its format reports [`Error::UnsupportedFormat`].
//!
//! JPEG keeps its YCbCr components: the decoder is told not to apply its own
//! color transform, and its component-run rows are split into a 4:4:4
//! planar image. The
//! RGB conversion then happens in [`crate::color`], so every comparison that
//! involves a JPEG uses one conversion formula.

use crate::error::{Error, Result};
use crate::image::{DecodedImage, SourceFormat};

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Identify the container format from leading magic bytes.
pub fn sniff_format(data: &[u8]) -> Result<SourceFormat> {
    if data.starts_with(JPEG_MAGIC) {
        Ok(SourceFormat::Jpeg)
    } else if data.starts_with(PNG_MAGIC) {
        Ok(SourceFormat::Png)
    } else {
        let head: Vec<String> = data.iter().take(8).map(|b| format!("{b:02x}")).collect();
        Err(Error::UnsupportedFormat(format!(
            "not a JPEG or PNG stream (leading bytes: [{}])",
            head.join(" ")
        )))
    }
}

/// Decode JPEG or PNG bytes.
pub fn decode_image(data: &[u8]) -> Result<DecodedImage> {
    match sniff_format(data)? {
        SourceFormat::Jpeg => decode_jpeg(data),
        SourceFormat::Png => decode_png(data),
    }
}

/// Decode a baseline or progressive JPEG into planar YCbCr.
///
/// Grayscale JPEGs decode to a gray buffer. CMYK is rejected.
#[cfg(feature = "jpeg-decode")]
pub fn decode_jpeg(data: &[u8]) -> Result<DecodedImage> {
    use std::io::Cursor;

    use crate::image::{PixelBuffer, YCbCrImage};

    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(data));
    decoder.set_color_transform(jpeg_decoder::ColorTransform::None);
    let pixels = decoder
        .decode()
        .map_err(|e| Error::decode("jpeg-decoder", e.to_string()))?;

    let info = decoder
        .info()
        .ok_or_else(|| Error::decode("jpeg-decoder", "missing JPEG info after decode"))?;
    let width = usize::from(info.width);
    let height = usize::from(info.height);

    log::trace!("jpeg {}x{} {:?}", width, height, info.pixel_format);

    match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => {
            // Without a color transform the decoder emits each row as whole
            // component runs, not interleaved triples.
            let planar = YCbCrImage::from_component_rows(width, height, &pixels)?;
            Ok(DecodedImage::new(PixelBuffer::YCbCr(planar), SourceFormat::Jpeg))
        }
        jpeg_decoder::PixelFormat::L8 => DecodedImage::from_gray8(pixels, width, height, SourceFormat::Jpeg),
        jpeg_decoder::PixelFormat::L16 => {
            // Big-endian samples; keep the high byte.
            let gray = pixels.chunks_exact(2).map(|c| c[0]).collect();
            DecodedImage::from_gray8(gray, width, height, SourceFormat::Jpeg)
        }
        jpeg_decoder::PixelFormat::CMYK32 => Err(Error::UnsupportedFormat(
            "CMYK JPEGs are not supported".to_string(),
        )),
    }
}

/// JPEG decoding is disabled in this build.
#[cfg(not(feature = "jpeg-decode"))]
pub fn decode_jpeg(_data: &[u8]) -> Result<DecodedImage> {
    Err(Error::UnsupportedFormat(
        "JPEG support requires the `jpeg-decode` feature".to_string(),
    ))
}

/// Decode a PNG.
///
/// 8-bit RGBA keeps straight alpha, 8-bit RGB becomes opaque packed RGBA,
/// 8-bit gray stays gray. Every other color type and bit depth is widened
/// to 16-bit RGBA.
#[cfg(feature = "png-decode")]
pub fn decode_png(data: &[u8]) -> Result<DecodedImage> {
    use image::DynamicImage;
    use imgref::ImgVec;
    use rgb::RGBA16;

    use crate::image::PixelBuffer;

    let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| Error::decode("png", e.to_string()))?;
    let width = img.width() as usize;
    let height = img.height() as usize;

    log::trace!("png {}x{} {:?}", width, height, img.color());

    match img {
        DynamicImage::ImageRgba8(buf) => {
            DecodedImage::from_nrgba8(buf.as_raw(), width, height, SourceFormat::Png)
        }
        DynamicImage::ImageRgb8(buf) => {
            DecodedImage::from_rgb8(buf.as_raw(), width, height, SourceFormat::Png)
        }
        DynamicImage::ImageLuma8(buf) => {
            DecodedImage::from_gray8(buf.into_raw(), width, height, SourceFormat::Png)
        }
        DynamicImage::ImageLumaA8(buf) => {
            let rgba: Vec<u8> = buf
                .as_raw()
                .chunks_exact(2)
                .flat_map(|c| [c[0], c[0], c[0], c[1]])
                .collect();
            DecodedImage::from_nrgba8(&rgba, width, height, SourceFormat::Png)
        }
        other => {
            let pixels: Vec<RGBA16> = other
                .to_rgba16()
                .as_raw()
                .chunks_exact(4)
                .map(|c| RGBA16::new(c[0], c[1], c[2], c[3]))
                .collect();
            Ok(DecodedImage::new(
                PixelBuffer::Rgba64(ImgVec::new(pixels, width, height)),
                SourceFormat::Png,
            ))
        }
    }
}

/// PNG decoding is disabled in this build.
#[cfg(not(feature = "png-decode"))]
pub fn decode_png(_data: &[u8]) -> Result<DecodedImage> {
    Err(Error::UnsupportedFormat(
        "PNG support requires the `png-decode` feature".to_string(),
    ))
}

/// Type alias for decode callbacks accepted by [`crate::PsnrCalculator`].
pub type DecodeFn = Box<dyn Fn(&[u8]) -> Result<DecodedImage> + Send + Sync + 'static>;

/// Boxed [`decode_image`], the calculator's default decoder.
pub fn default_decoder() -> DecodeFn {
    Box::new(decode_image)
}
