//! Image decoding and encoding, backed by the `image` crate.
use crate::{summary::Colorspace, LogboardError, Result};
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageError, ImageOutputFormat, RgbImage, RgbaImage,
};
use std::path::Path;

/// Output format of [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG, lossless. Supports every colorspace except YUV.
    Png,

    /// JPEG with the given quality in `1..=100`.
    Jpeg(u8),

    /// Windows bitmap.
    Bmp,
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Png
    }
}

impl From<ImageFormat> for ImageOutputFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => ImageOutputFormat::Png,
            ImageFormat::Jpeg(quality) => ImageOutputFormat::Jpeg(quality),
            ImageFormat::Bmp => ImageOutputFormat::Bmp,
        }
    }
}

/// Decoded pixels in row-major, interleaved-channel order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    /// Pixel data, `width * height * channels` bytes.
    pub pixels: Vec<u8>,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Number of channels, from 1 (gray) to 4 (RGBA).
    pub channels: u8,
}

impl RawImage {
    fn from_dynamic(image: DynamicImage) -> Self {
        let (width, height, pixels, channels) = match image {
            DynamicImage::ImageLuma8(buf) => (buf.width(), buf.height(), buf.into_raw(), 1),
            DynamicImage::ImageLumaA8(buf) => (buf.width(), buf.height(), buf.into_raw(), 2),
            DynamicImage::ImageRgb8(buf) => (buf.width(), buf.height(), buf.into_raw(), 3),
            DynamicImage::ImageRgba8(buf) => (buf.width(), buf.height(), buf.into_raw(), 4),
            other => {
                let buf = other.to_rgba8();
                (buf.width(), buf.height(), buf.into_raw(), 4)
            }
        };
        Self {
            pixels,
            width,
            height,
            channels,
        }
    }
}

fn codec_error(e: ImageError) -> LogboardError {
    log::error!("Image codec failed: {}", e);
    LogboardError::Codec(e.to_string())
}

/// Loads and decodes an image file.
///
/// 16-bit and BGR(A) images are converted to 8-bit RGBA.
pub fn load(path: impl AsRef<Path>) -> Result<RawImage> {
    let image = image::open(path.as_ref()).map_err(codec_error)?;
    Ok(RawImage::from_dynamic(image))
}

/// Decodes an encoded image held in memory.
pub fn load_from_memory(buf: &[u8]) -> Result<RawImage> {
    let image = image::load_from_memory(buf).map_err(codec_error)?;
    Ok(RawImage::from_dynamic(image))
}

/// Encodes raw pixels.
///
/// `pixels` must hold exactly `width * height * colorspace.channels()` bytes.
/// BGRA pixels are reordered to RGBA before encoding. YUV cannot be encoded.
pub fn encode(
    pixels: &[u8],
    width: u32,
    height: u32,
    colorspace: Colorspace,
    format: ImageFormat,
) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize * colorspace.channels();
    if pixels.len() != expected {
        return Err(LogboardError::InvalidImage(format!(
            "got {} bytes, expected {}",
            pixels.len(),
            expected
        )));
    }

    let pixels = pixels.to_vec();
    let image = match colorspace {
        Colorspace::Grayscale => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        Colorspace::GrayscaleAlpha => {
            GrayAlphaImage::from_raw(width, height, pixels).map(DynamicImage::ImageLumaA8)
        }
        Colorspace::Rgb => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        Colorspace::Rgba => RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8),
        Colorspace::Bgra => {
            let mut pixels = pixels;
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
            RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
        }
        Colorspace::Yuv => {
            return Err(LogboardError::Codec(
                "YUV images cannot be encoded".to_string(),
            ))
        }
    }
    .ok_or_else(|| LogboardError::InvalidImage("pixel buffer too small".to_string()))?;

    let mut buf = vec![];
    image.write_to(&mut buf, format).map_err(codec_error)?;
    Ok(buf)
}
