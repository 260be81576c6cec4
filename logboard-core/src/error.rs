//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum LogboardError {
    /// I/O error on an event file or a side file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The writer has been closed or its file could not be opened.
    #[error("Writer is not ready: {0}")]
    WriterNotReady(String),

    /// A record with an empty payload was given.
    #[error("Empty record")]
    EmptyRecord,

    /// Invalid image data or metadata.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Inconsistent histogram statistics.
    #[error("Invalid histogram: {0}")]
    InvalidHistogram(String),

    /// Invalid audio data.
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// Embedding matrix or labels do not match the declared shape.
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// Image encoding or decoding failed.
    #[error("Codec error: {0}")]
    Codec(String),

    /// A framed record failed its checksum or was truncated.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A record payload is not a valid event.
    #[error("Decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A lock shared with another thread was poisoned.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, LogboardError>;
