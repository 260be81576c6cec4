use super::{frame_record, open_event_file, EventWriter};
use crate::{util, Event, LogboardError, Result};
use log::{debug, error};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Writes events synchronously, flushing after every record.
///
/// Each call to [`EventWriter::write`] returns only after the record has been handed
/// to the operating system, so readers see it immediately.
pub struct FileWriter {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    healthy: bool,
}

impl FileWriter {
    /// Opens a new event file for `prefix`.
    ///
    /// The file is `{prefix}.out.tfevents.{timestamp}.{hostname}`. It is appended to
    /// if `resume` is set and truncated otherwise. If the file cannot be opened, the
    /// failure is logged and the writer is not [`ready`](EventWriter::ready).
    pub fn new(prefix: impl AsRef<Path>, hostname: &str, resume: bool) -> Self {
        let path = util::event_file_path(prefix.as_ref(), util::timestamp(), hostname);
        let file = match open_event_file(&path, resume) {
            Ok(file) => {
                debug!("Opened event file {}", path.display());
                Some(file)
            }
            Err(e) => {
                error!("Failed to create record file '{}': {}", path.display(), e);
                None
            }
        };

        Self {
            healthy: file.is_some(),
            path,
            file,
        }
    }
}

fn not_ready(path: &Path) -> LogboardError {
    LogboardError::WriterNotReady(path.display().to_string())
}

impl EventWriter for FileWriter {
    fn write(&mut self, event: &Event) -> Result<usize> {
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => return Err(not_ready(&self.path)),
        };

        let payload = event.encode();
        if payload.is_empty() {
            return Err(LogboardError::EmptyRecord);
        }

        let frame = frame_record(&payload);
        match file.write_all(&frame).and_then(|_| file.flush()) {
            Ok(()) => Ok(frame.len()),
            Err(e) => {
                error!("Failed to write record to '{}': {}", self.path.display(), e);
                self.healthy = false;
                Err(e.into())
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self.file.as_mut() {
            Some(file) => Ok(file.flush()?),
            None => Err(not_ready(&self.path)),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            debug!("Closed event file {}", self.path.display());
        }
        Ok(())
    }

    fn ready(&self) -> bool {
        self.file.is_some() && self.healthy
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!("Failed to close '{}': {}", self.path.display(), e);
        }
    }
}
