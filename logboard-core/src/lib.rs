#![warn(missing_docs)]
//! Core components for writing TensorBoard-compatible event files.
//!
//! An event file is an append-only sequence of framed records. Each record holds one
//! serialized [`proto::Event`] and is laid out as
//!
//! | field         | size           | content                                  |
//! |---------------|----------------|------------------------------------------|
//! | `length`      | 8 bytes (LE)   | byte length of the payload               |
//! | `length_crc`  | 4 bytes (LE)   | [`masked_crc32c`] of the `length` bytes  |
//! | `payload`     | `length` bytes | serialized event                         |
//! | `payload_crc` | 4 bytes (LE)   | [`masked_crc32c`] of the payload         |
//!
//! This crate provides:
//!
//! * [`crc32c`] and [`masked_crc32c`], the checksum engine.
//! * [`FileWriter`] and [`AsyncFileWriter`], two implementations of [`EventWriter`].
//! * [`EventFileReader`] for reading the records back.
//! * The [`summary`] module, which builds typed summaries (scalar, histogram,
//!   image, mosaic, audio, text).
//! * The [`codec`] module, a thin adapter over the `image` crate.
//!
//! ```no_run
//! use logboard_core::{summary, util, Event, EventWriter, FileWriter};
//!
//! # fn main() -> logboard_core::Result<()> {
//! let hostname = util::hostname();
//! let mut writer = FileWriter::new("runs/exp1/events", &hostname, false);
//! let event = Event::new(summary::scalar("loss", 0.25), Some(1));
//! writer.write(&event)?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
pub mod codec;
mod crc;
pub mod error;
mod event;
pub mod proto;
mod reader;
pub mod summary;
pub mod util;
mod writer;

pub use crc::{crc32c, masked_crc32c};
pub use error::{LogboardError, Result};
pub use event::Event;
pub use reader::EventFileReader;
pub use writer::{
    AsyncFileWriter, EventWriter, FileWriter, DEFAULT_FLUSH_SECS, FILE_VERSION,
};
