//! Builders of typed summaries.
//!
//! Every builder returns a [`proto::Summary`] holding exactly one tagged value,
//! ready to be wrapped into an [`Event`](crate::Event).
mod histogram;
mod raster;
pub use histogram::{default_buckets, histogram, histogram_raw, HistogramStats};
pub use raster::{compose_mosaic, image, images, Colorspace, ImageMetadata, DEFAULT_MAX_COLS};

use crate::{
    proto::{
        self,
        summary::{value::Value, Audio},
        summary_metadata::PluginData,
        tensor_shape_proto::Dim,
        DataType, SummaryMetadata, TensorProto, TensorShapeProto,
    },
    LogboardError, Result,
};

/// Name of the plugin which renders text summaries.
pub const TEXT_PLUGIN_NAME: &str = "text";

/// Suffix appended to the tag of text summaries.
pub const TEXT_TAG_SUFFIX: &str = "/text_summary";

/// Default sample rate of [`AudioMetadata`] in Hz.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Default content type of [`AudioMetadata`].
pub const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/wav";

/// Wraps a single value into a summary.
pub(crate) fn single_value(
    tag: &str,
    value: Value,
    metadata: Option<SummaryMetadata>,
) -> proto::Summary {
    proto::Summary {
        value: vec![proto::summary::Value {
            tag: clean_tag(tag),
            node_name: String::new(),
            metadata,
            value: Some(value),
        }],
    }
}

/// Returns the tag unchanged.
///
/// Tags are passed through as given. Use [`sanitize_tag`] to restrict them to the
/// characters TensorBoard handles without escaping.
pub fn clean_tag(tag: &str) -> String {
    tag.to_string()
}

/// Strips leading slashes and replaces characters outside `[A-Za-z0-9._/-]` with `_`.
pub fn sanitize_tag(tag: &str) -> String {
    let cleaned = tag
        .trim_start_matches('/')
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '/' | '-' => c,
            _ => '_',
        })
        .collect::<String>();

    if cleaned != tag {
        log::info!("Summary name {} is illegal; using {} instead", tag, cleaned);
    }
    cleaned
}

/// Builds a scalar summary.
pub fn scalar(tag: &str, value: f32) -> proto::Summary {
    single_value(tag, Value::SimpleValue(value), None)
}

/// Builds a text summary.
///
/// The text is stored as a string tensor of shape `[1]`, tagged `{tag}/text_summary`
/// and marked for the text plugin.
pub fn text(tag: &str, text: &str) -> proto::Summary {
    let metadata = SummaryMetadata {
        plugin_data: Some(PluginData {
            plugin_name: TEXT_PLUGIN_NAME.to_string(),
            content: vec![],
        }),
        ..Default::default()
    };
    let tensor = TensorProto {
        dtype: DataType::DtString as i32,
        tensor_shape: Some(TensorShapeProto {
            dim: vec![Dim {
                size: 1,
                name: String::new(),
            }],
            unknown_rank: false,
        }),
        string_val: vec![text.as_bytes().to_vec()],
    };

    let tag = format!("{}{}", tag, TEXT_TAG_SUFFIX);
    single_value(&tag, Value::Tensor(tensor), Some(metadata))
}

/// Describes an encoded audio clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMetadata {
    /// Number of channels.
    pub num_channels: i64,

    /// Length in frames.
    pub length_frames: i64,

    /// Sample rate in Hz.
    pub sample_rate: f32,

    /// MIME type of the encoded audio.
    pub content_type: String,
}

impl AudioMetadata {
    /// Constructs metadata with the default sample rate and content type.
    pub fn new(num_channels: i64, length_frames: i64) -> Self {
        Self {
            num_channels,
            length_frames,
            sample_rate: DEFAULT_SAMPLE_RATE,
            content_type: DEFAULT_AUDIO_CONTENT_TYPE.to_string(),
        }
    }

    /// Sets the sample rate.
    pub fn sample_rate(mut self, v: f32) -> Self {
        self.sample_rate = v;
        self
    }

    /// Sets the content type.
    pub fn content_type(mut self, v: impl Into<String>) -> Self {
        self.content_type = v.into();
        self
    }
}

/// Builds an audio summary. Empty buffers are rejected.
pub fn audio(tag: &str, encoded_audio: &[u8], meta: &AudioMetadata) -> Result<proto::Summary> {
    if encoded_audio.is_empty() {
        log::error!("Empty audio data for '{}'", tag);
        return Err(LogboardError::InvalidAudio("empty audio data".to_string()));
    }

    let audio = Audio {
        sample_rate: meta.sample_rate,
        num_channels: meta.num_channels,
        length_frames: meta.length_frames,
        encoded_audio_string: encoded_audio.to_vec(),
        content_type: meta.content_type.clone(),
    };
    Ok(single_value(tag, Value::Audio(audio), None))
}
