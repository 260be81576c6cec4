#![warn(missing_docs)]
//! Recording training metrics into TensorBoard-compatible event files.
//!
//! [`Recorder`] is the entry point. It owns the event writers of a log directory and
//! turns each `add_*` call into one framed event:
//!
//! ```no_run
//! use logboard::{Recorder, RecorderConfig, WriterKind};
//! use logboard_core::summary::AudioMetadata;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = RecorderConfig::default()
//!     .log_dir("runs/exp1")
//!     .writer(WriterKind::Async)
//!     .flush_secs(10);
//! let recorder = Recorder::from_config(&config);
//!
//! recorder.add_scalar("train/loss", 0.25, 1)?;
//! recorder.add_scalars("lr", vec![("actor", 1e-4), ("critic", 3e-4)], 1)?;
//! recorder.add_histogram("weights", &[0.1, -0.2, 0.3], 1)?;
//! recorder.add_audio("beep", &std::fs::read("beep.wav")?, &AudioMetadata::new(1, 44100), 1)?;
//! recorder.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Record`] bundles heterogeneous values of one step; see
//! [`Recorder::write_record`].
mod config;
mod projector;
mod record;
mod recorder;

pub use config::{RecorderConfig, WriterKind};
pub use projector::{Projector, PROJECTOR_CONFIG};
pub use record::{Record, RecordError, RecordValue};
pub use recorder::{writer_factory, Recorder, WriterFactory, EVENT_FILE_PREFIX};
