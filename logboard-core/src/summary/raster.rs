//! Image summaries, including mosaics of equally sized images.
use super::single_value;
use crate::{
    codec::{self, ImageFormat},
    proto::{self, summary::value::Value},
    LogboardError, Result,
};
use std::convert::TryFrom;

/// Default maximum number of columns of a mosaic.
pub const DEFAULT_MAX_COLS: usize = 8;

/// Colorspace of an image, with the numbering of the event file schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    /// One channel.
    Grayscale = 1,

    /// Gray and alpha.
    GrayscaleAlpha = 2,

    /// Red, green, blue.
    Rgb = 3,

    /// Red, green, blue, alpha.
    Rgba = 4,

    /// Digital YUV, three channels.
    Yuv = 5,

    /// Blue, green, red, alpha.
    Bgra = 6,
}

impl Colorspace {
    /// Number of bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            Colorspace::Grayscale => 1,
            Colorspace::GrayscaleAlpha => 2,
            Colorspace::Rgb | Colorspace::Yuv => 3,
            Colorspace::Rgba | Colorspace::Bgra => 4,
        }
    }

    /// Colorspace of a decoded image with `channels` channels.
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Colorspace::Grayscale),
            2 => Some(Colorspace::GrayscaleAlpha),
            3 => Some(Colorspace::Rgb),
            4 => Some(Colorspace::Rgba),
            _ => None,
        }
    }
}

impl TryFrom<i32> for Colorspace {
    type Error = LogboardError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Colorspace::Grayscale),
            2 => Ok(Colorspace::GrayscaleAlpha),
            3 => Ok(Colorspace::Rgb),
            4 => Ok(Colorspace::Rgba),
            5 => Ok(Colorspace::Yuv),
            6 => Ok(Colorspace::Bgra),
            _ => Err(LogboardError::InvalidImage(format!(
                "colorspace must be in [1, 6], got {}",
                value
            ))),
        }
    }
}

/// Width, height and colorspace of an image.
///
/// Width and height are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    width: u32,
    height: u32,
    colorspace: Colorspace,
}

impl ImageMetadata {
    /// Validates and constructs the metadata.
    ///
    /// Non-positive sizes and colorspaces outside `[1, 6]` are rejected.
    pub fn new(width: i32, height: i32, colorspace: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            log::error!("Invalid image size: {}x{}", width, height);
            return Err(LogboardError::InvalidImage(format!(
                "size must be positive, got {}x{}",
                width, height
            )));
        }

        let colorspace = Colorspace::try_from(colorspace).map_err(|e| {
            log::error!("Invalid image colorspace: {}", colorspace);
            e
        })?;

        Ok(Self {
            width: width as u32,
            height: height as u32,
            colorspace,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colorspace.
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Number of bytes of a raw image with this metadata, `width * height * colorspace`.
    ///
    /// This is the colorspace number, not [`Colorspace::channels`], so raw YUV and BGRA
    /// mosaics are sized 5 and 6 bytes per pixel and are later rejected by the codec.
    pub fn pixel_len(&self) -> usize {
        self.width as usize * self.height as usize * self.colorspace as usize
    }

    fn to_proto(self, encoded_image_string: Vec<u8>) -> proto::summary::Image {
        proto::summary::Image {
            height: self.height as i32,
            width: self.width as i32,
            colorspace: self.colorspace as i32,
            encoded_image_string,
        }
    }
}

/// Builds an image summary from an encoded image such as a PNG file.
///
/// Empty buffers are rejected.
pub fn image(tag: &str, encoded_image: &[u8], meta: &ImageMetadata) -> Result<proto::Summary> {
    if encoded_image.is_empty() {
        log::error!("Empty image data for '{}'", tag);
        return Err(LogboardError::InvalidImage("empty image data".to_string()));
    }

    let image = meta.to_proto(encoded_image.to_vec());
    Ok(single_value(tag, Value::Image(image), None))
}

/// Tiles equally sized raw images into a single raw image.
///
/// The images are laid out row-major in a grid of `min(n, max_cols)` columns and
/// `ceil(n / cols)` rows. Grid cells without an image are zero-filled. Every image
/// must hold exactly `meta.pixel_len()` bytes.
///
/// Returns the tiled pixels and their metadata.
pub fn compose_mosaic<T: AsRef<[u8]>>(
    images: &[T],
    meta: &ImageMetadata,
    max_cols: usize,
) -> Result<(Vec<u8>, ImageMetadata)> {
    if images.is_empty() {
        log::error!("Empty image list");
        return Err(LogboardError::InvalidImage("empty image list".to_string()));
    }
    if max_cols == 0 {
        return Err(LogboardError::InvalidImage(
            "max_cols must be positive".to_string(),
        ));
    }

    let len = images[0].as_ref().len();
    if len != meta.pixel_len() {
        log::error!(
            "Incomplete image data, got {}, expected {}",
            len,
            meta.pixel_len()
        );
        return Err(LogboardError::InvalidImage(format!(
            "got {} bytes, expected {}",
            len,
            meta.pixel_len()
        )));
    }
    if let Some(i) = images.iter().position(|img| img.as_ref().len() != len) {
        log::error!("Image {} has a different shape", i);
        return Err(LogboardError::InvalidImage(format!(
            "image {} has {} bytes, expected {}",
            i,
            images[i].as_ref().len(),
            len
        )));
    }

    let n = images.len();
    let ncols = n.min(max_cols);
    let nrows = (n + ncols - 1) / ncols;
    let height = meta.height as usize;
    let row_len = meta.width as usize * meta.colorspace as usize;

    let mut data = vec![0u8; ncols * nrows * len];
    for (k, img) in images.iter().enumerate() {
        let (r, c) = (k / ncols, k % ncols);
        let img = img.as_ref();
        for i in 0..height {
            let dst = ((r * height + i) * ncols + c) * row_len;
            let src = i * row_len;
            data[dst..dst + row_len].copy_from_slice(&img[src..src + row_len]);
        }
    }

    let composed = ImageMetadata {
        width: meta.width * ncols as u32,
        height: meta.height * nrows as u32,
        colorspace: meta.colorspace,
    };
    Ok((data, composed))
}

/// Builds an image summary of a mosaic of raw images.
///
/// The images are tiled with [`compose_mosaic`] and the result is encoded as PNG.
/// YUV and BGRA mosaics cannot be encoded and fail.
pub fn images<T: AsRef<[u8]>>(
    tag: &str,
    images: &[T],
    meta: &ImageMetadata,
    max_cols: usize,
) -> Result<proto::Summary> {
    let (pixels, composed) = compose_mosaic(images, meta, max_cols)?;
    let encoded = codec::encode(
        &pixels,
        composed.width,
        composed.height,
        composed.colorspace,
        ImageFormat::Png,
    )
    .map_err(|e| {
        log::error!("Failed to encode image: {}", e);
        e
    })?;

    Ok(single_value(
        tag,
        Value::Image(composed.to_proto(encoded)),
        None,
    ))
}
