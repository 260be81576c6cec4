use super::Recorder;
use crate::record::{Record, RecordValue};
use log::error;
use logboard_core::{
    codec::{self, ImageFormat},
    summary::{Colorspace, ImageMetadata},
    LogboardError, Result,
};

impl Recorder {
    /// Writes every value of `record` with the `add_*` method matching its type.
    ///
    /// * [`RecordValue::Scalar`] with [`add_scalar`](Recorder::add_scalar).
    /// * [`RecordValue::Array1`] with [`add_histogram`](Recorder::add_histogram).
    /// * [`RecordValue::Array2`] and [`RecordValue::Array3`] as images scaled from
    ///   their minimum and maximum to `[0, 255]`.
    /// * [`RecordValue::String`] with [`add_text`](Recorder::add_text).
    /// * [`RecordValue::DateTime`] is skipped.
    ///
    /// Like [`add_scalars`](Recorder::add_scalars), every value is attempted and the
    /// first error is returned.
    pub fn write_record(&self, record: &Record, step: i64) -> Result<usize> {
        let mut total = 0;
        let mut failure = None;

        for (key, value) in record.iter() {
            let res = match value {
                RecordValue::Scalar(v) => self.add_scalar(key, *v, step),
                RecordValue::DateTime(_) => continue,
                RecordValue::Array1(v) => {
                    let values = v.iter().map(|x| *x as f64).collect::<Vec<_>>();
                    self.add_histogram(key, &values, step)
                }
                RecordValue::Array2(data, [h, w]) => {
                    self.add_array(key, data, [1, *h, *w], step)
                }
                RecordValue::Array3(data, shape) => self.add_array(key, data, *shape, step),
                RecordValue::String(s) => self.add_text(key, s, step),
            };

            match res {
                Ok(n) => total += n,
                Err(e) => {
                    error!("Failed to write '{}' of record: {}", key, e);
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }

    /// Writes a `[channels, height, width]` array as a PNG image.
    fn add_array(&self, tag: &str, data: &[f32], shape: [usize; 3], step: i64) -> Result<usize> {
        let [c, h, w] = shape;
        let colorspace = match c {
            1 | 3 | 4 => Colorspace::from_channels(c as u8),
            _ => None,
        }
        .ok_or_else(|| LogboardError::InvalidImage(format!("{} channels", c)))?;
        let meta = ImageMetadata::new(w as i32, h as i32, colorspace as i32)?;
        if data.len() != meta.pixel_len() {
            return Err(LogboardError::InvalidImage(format!(
                "array of shape {:?} has {} elements",
                shape,
                data.len()
            )));
        }

        let pixels = to_pixels(data, c);
        let encoded = codec::encode(
            &pixels,
            meta.width(),
            meta.height(),
            colorspace,
            ImageFormat::Png,
        )?;
        self.add_image(tag, &encoded, &meta, step)
    }
}

/// Scales a channel-major array to `[0, 255]` and interleaves the channels.
///
/// A constant array maps to zeros.
fn to_pixels(data: &[f32], channels: usize) -> Vec<u8> {
    let min = data.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = data.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let scale = max - min;
    let plane = data.len() / channels;

    let mut pixels = vec![0u8; data.len()];
    if scale > 0.0 {
        for (k, channel) in data.chunks(plane).enumerate() {
            for (i, v) in channel.iter().enumerate() {
                pixels[i * channels + k] = ((v - min) / scale * 255.0) as u8;
            }
        }
    }
    pixels
}
