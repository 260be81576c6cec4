//! Key/value records of heterogeneous values.
//!
//! A [`Record`] collects the values produced at one step, e.g. a loss, a weight
//! histogram and an attention map, and is written at once with
//! [`Recorder::write_record`](crate::Recorder::write_record).
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};
use thiserror::Error;

/// Errors on accessing values of a [`Record`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// The key is not in the record.
    #[error("Key error: {0}")]
    Key(String),

    /// The value has another type than requested.
    #[error("Type error: expected {0}")]
    ValueType(&'static str),
}

/// A value stored in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Written as a scalar.
    Scalar(f32),

    /// Not written to event files.
    DateTime(DateTime<Local>),

    /// Written as a histogram.
    Array1(Vec<f32>),

    /// `[height, width]`, written as a normalized grayscale image.
    Array2(Vec<f32>, [usize; 2]),

    /// `[channels, height, width]` with 1, 3 or 4 channels, written as a normalized image.
    Array3(Vec<f32>, [usize; 3]),

    /// Written as text.
    String(String),
}

/// A set of named values.
///
/// ```rust
/// use logboard::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("loss", 0.5);
/// record.insert("note", RecordValue::String("warmup done".to_string()));
/// assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record with a single scalar.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        let mut record = Self::empty();
        record.insert(name, RecordValue::Scalar(value));
        record
    }

    /// Creates a record from key/value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Keys of the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a value, replacing the previous one of the same key.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Iterates over the key/value pairs in arbitrary order.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets a value.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records. Values of `record` win on duplicated keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record holds no value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets a scalar.
    pub fn get_scalar(&self, k: &str) -> Result<f32, RecordError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(RecordError::ValueType("Scalar")),
            None => Err(RecordError::Key(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array.
    pub fn get_array1(&self, k: &str) -> Result<&[f32], RecordError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v),
            Some(_) => Err(RecordError::ValueType("Array1")),
            None => Err(RecordError::Key(k.to_string())),
        }
    }

    /// Gets a string.
    pub fn get_string(&self, k: &str) -> Result<&str, RecordError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s),
            Some(_) => Err(RecordError::ValueType("String")),
            None => Err(RecordError::Key(k.to_string())),
        }
    }
}
