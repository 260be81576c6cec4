//! Event and summary messages of the TensorBoard event file schema.
//!
//! Only the subset of the schema written by this library is declared. Field numbers
//! follow `event.proto`, `summary.proto`, `tensor.proto` and `tensor_shape.proto`
//! so that the serialized bytes are readable by TensorBoard.

/// A single record in an event file.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    /// Timestamp in seconds since epoch.
    #[prost(double, tag = "1")]
    pub wall_time: f64,

    /// Global step of the event.
    #[prost(int64, tag = "2")]
    pub step: i64,

    /// Content of the event.
    #[prost(oneof = "event::What", tags = "3, 5")]
    pub what: Option<event::What>,
}

/// Nested types of [`Event`].
pub mod event {
    /// Content of an [`Event`](super::Event).
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum What {
        /// Version string, written as the first record of a file.
        #[prost(string, tag = "3")]
        FileVersion(String),

        /// A summary of tagged values.
        #[prost(message, tag = "5")]
        Summary(super::Summary),
    }
}

/// A set of tagged values.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Summary {
    /// Tagged values. This library always writes exactly one.
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<summary::Value>,
}

/// Nested types of [`Summary`].
pub mod summary {
    /// An encoded image.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Image {
        /// Height in pixels.
        #[prost(int32, tag = "1")]
        pub height: i32,

        /// Width in pixels.
        #[prost(int32, tag = "2")]
        pub width: i32,

        /// 1: grayscale, 2: grayscale + alpha, 3: RGB, 4: RGBA, 5: YUV, 6: BGRA.
        #[prost(int32, tag = "3")]
        pub colorspace: i32,

        /// Image in an encoded format such as PNG.
        #[prost(bytes = "vec", tag = "4")]
        pub encoded_image_string: Vec<u8>,
    }

    /// An encoded audio clip.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Audio {
        /// Sample rate in Hz.
        #[prost(float, tag = "1")]
        pub sample_rate: f32,

        /// Number of channels.
        #[prost(int64, tag = "2")]
        pub num_channels: i64,

        /// Length in frames.
        #[prost(int64, tag = "3")]
        pub length_frames: i64,

        /// Audio in an encoded format.
        #[prost(bytes = "vec", tag = "4")]
        pub encoded_audio_string: Vec<u8>,

        /// MIME type of the encoded audio.
        #[prost(string, tag = "5")]
        pub content_type: String,
    }

    /// A tagged value.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Value {
        /// Tag of the value.
        #[prost(string, tag = "1")]
        pub tag: String,

        /// Name of the node that produced the value.
        #[prost(string, tag = "7")]
        pub node_name: String,

        /// Metadata such as the plugin which renders the value.
        #[prost(message, optional, tag = "9")]
        pub metadata: Option<super::SummaryMetadata>,

        /// The value itself.
        #[prost(oneof = "value::Value", tags = "2, 4, 5, 6, 8")]
        pub value: Option<value::Value>,
    }

    /// Nested types of [`Value`].
    pub mod value {
        /// Payload of a [`Value`](super::Value).
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Value {
            /// A scalar.
            #[prost(float, tag = "2")]
            SimpleValue(f32),

            /// An image.
            #[prost(message, tag = "4")]
            Image(super::Image),

            /// A histogram.
            #[prost(message, tag = "5")]
            Histo(super::super::HistogramProto),

            /// An audio clip.
            #[prost(message, tag = "6")]
            Audio(super::Audio),

            /// A tensor, rendered according to the plugin in the metadata.
            #[prost(message, tag = "8")]
            Tensor(super::super::TensorProto),
        }
    }
}

/// Bucketed statistics of a set of values.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistogramProto {
    /// Minimum value.
    #[prost(double, tag = "1")]
    pub min: f64,

    /// Maximum value.
    #[prost(double, tag = "2")]
    pub max: f64,

    /// Number of values.
    #[prost(double, tag = "3")]
    pub num: f64,

    /// Sum of values.
    #[prost(double, tag = "4")]
    pub sum: f64,

    /// Sum of squared values.
    #[prost(double, tag = "5")]
    pub sum_squares: f64,

    /// Right edges of the buckets.
    #[prost(double, repeated, tag = "6")]
    pub bucket_limit: Vec<f64>,

    /// Counts of the buckets.
    #[prost(double, repeated, tag = "7")]
    pub bucket: Vec<f64>,
}

/// Metadata attached to a summary value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SummaryMetadata {
    /// Plugin which renders the value.
    #[prost(message, optional, tag = "1")]
    pub plugin_data: Option<summary_metadata::PluginData>,

    /// Name shown in TensorBoard.
    #[prost(string, tag = "2")]
    pub display_name: String,

    /// Longer description.
    #[prost(string, tag = "3")]
    pub summary_description: String,
}

/// Nested types of [`SummaryMetadata`].
pub mod summary_metadata {
    /// Plugin name and its private data.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PluginData {
        /// Name of the plugin, e.g. `text`.
        #[prost(string, tag = "1")]
        pub plugin_name: String,

        /// Plugin specific content.
        #[prost(bytes = "vec", tag = "2")]
        pub content: Vec<u8>,
    }
}

/// Element type of a [`TensorProto`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    /// Not a valid type.
    DtInvalid = 0,

    /// 32-bit float.
    DtFloat = 1,

    /// 64-bit float.
    DtDouble = 2,

    /// Byte string.
    DtString = 7,
}

/// Shape of a tensor.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorShapeProto {
    /// Dimensions from outermost to innermost.
    #[prost(message, repeated, tag = "2")]
    pub dim: Vec<tensor_shape_proto::Dim>,

    /// True if the rank is unknown.
    #[prost(bool, tag = "3")]
    pub unknown_rank: bool,
}

/// Nested types of [`TensorShapeProto`].
pub mod tensor_shape_proto {
    /// One dimension of a tensor.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Dim {
        /// Size of the dimension.
        #[prost(int64, tag = "1")]
        pub size: i64,

        /// Optional name of the dimension.
        #[prost(string, tag = "2")]
        pub name: String,
    }
}

/// A tensor value. Only string tensors are written by this library.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    /// Element type.
    #[prost(enumeration = "DataType", tag = "1")]
    pub dtype: i32,

    /// Shape of the tensor.
    #[prost(message, optional, tag = "2")]
    pub tensor_shape: Option<TensorShapeProto>,

    /// Elements of a string tensor.
    #[prost(bytes = "vec", repeated, tag = "8")]
    pub string_val: Vec<Vec<u8>>,
}
