//! Writers of event files.
mod async_file_writer;
mod file_writer;

pub use async_file_writer::AsyncFileWriter;
pub use file_writer::FileWriter;

use crate::{event::file_version_event, masked_crc32c, Event, Result};
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

/// Version string of the first event in every new event file.
pub const FILE_VERSION: &str = "brain.Event:2";

/// Default interval of the background flush of [`AsyncFileWriter`], in seconds.
pub const DEFAULT_FLUSH_SECS: u64 = 120;

/// Appends framed events to a single event file.
///
/// A writer owns its file from construction until [`EventWriter::close`] or drop.
/// Implementations never panic on I/O failures; they log the failure and return an error.
pub trait EventWriter: Send {
    /// Serializes `event` and appends it as one framed record.
    ///
    /// Returns the number of bytes of the framed record.
    fn write(&mut self, event: &Event) -> Result<usize>;

    /// Flushes buffered records to the operating system.
    fn flush(&mut self) -> Result<()>;

    /// Flushes and closes the file. Closing a closed writer is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Returns `true` if the file is open and no write has failed.
    fn ready(&self) -> bool;

    /// Path of the event file.
    fn path(&self) -> &Path;
}

/// Frames `payload` as `length | crc(length) | payload | crc(payload)`.
pub(crate) fn frame_record(payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() as u64).to_le_bytes();
    let mut buf = Vec::with_capacity(payload.len() + 16);
    buf.extend_from_slice(&len);
    buf.extend_from_slice(&masked_crc32c(&len).to_le_bytes());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&masked_crc32c(payload).to_le_bytes());
    buf
}

/// Opens an event file, truncating it unless `resume` is set.
///
/// An empty file gets the file version record before anything else.
pub(crate) fn open_event_file(path: &Path, resume: bool) -> std::io::Result<BufWriter<File>> {
    let mut options = OpenOptions::new();
    options.create(true);
    if resume {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    let file = options.open(path)?;
    let is_empty = file.metadata()?.len() == 0;
    let mut file = BufWriter::new(file);
    if is_empty {
        file.write_all(&frame_record(&file_version_event(FILE_VERSION)))?;
        file.flush()?;
    }
    Ok(file)
}
