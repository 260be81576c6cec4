use super::{frame_record, open_event_file, EventWriter};
use crate::{util, Event, LogboardError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, warn};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    thread::JoinHandle,
    time::Duration,
};

type SharedFile = Arc<Mutex<Option<BufWriter<File>>>>;

/// Writes events on the caller's thread and flushes them periodically on a
/// background thread.
///
/// Records are appended to a buffered file handle without flushing. A flush thread
/// wakes up every `flush_interval` and flushes the buffer. The handle is guarded by a
/// single lock, so a flush never observes a partially written record.
///
/// A failed write marks the writer as not [`ready`](EventWriter::ready), as
/// [`FileWriter`](super::FileWriter) does.
///
/// [`EventWriter::close`], also called on drop, stops the flush thread, flushes pending
/// records, closes the file and joins the thread.
pub struct AsyncFileWriter {
    path: PathBuf,
    file: SharedFile,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    healthy: bool,
}

impl AsyncFileWriter {
    /// Opens a new event file for `prefix` and starts the flush thread.
    ///
    /// If the file cannot be opened, the failure is logged, no thread is started and
    /// the writer is not [`ready`](EventWriter::ready).
    pub fn new(
        prefix: impl AsRef<Path>,
        hostname: &str,
        resume: bool,
        flush_interval: Duration,
    ) -> Self {
        let path = util::event_file_path(prefix.as_ref(), util::timestamp(), hostname);
        match open_event_file(&path, resume) {
            Ok(file) => {
                let file = Arc::new(Mutex::new(Some(file)));
                let (stop, stop_receiver) = bounded(1);
                let worker = {
                    let file = file.clone();
                    let path = path.clone();
                    std::thread::spawn(move || {
                        Self::run_flush_loop(stop_receiver, file, flush_interval, path)
                    })
                };
                debug!("Opened event file {}", path.display());
                Self {
                    path,
                    file,
                    stop: Some(stop),
                    worker: Some(worker),
                    healthy: true,
                }
            }
            Err(e) => {
                error!("Failed to create record file '{}': {}", path.display(), e);
                Self {
                    path,
                    file: Arc::new(Mutex::new(None)),
                    stop: None,
                    worker: None,
                    healthy: false,
                }
            }
        }
    }

    /// Flushes the file every `interval` until a stop signal arrives or the sender is dropped.
    ///
    /// Flush failures are logged and do not stop the loop.
    fn run_flush_loop(stop: Receiver<()>, file: SharedFile, interval: Duration, path: PathBuf) {
        loop {
            match stop.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => match file.lock() {
                    Ok(mut guard) => {
                        if let Some(file) = guard.as_mut() {
                            if let Err(e) = file.flush() {
                                warn!("Failed to flush '{}': {}", path.display(), e);
                            }
                        }
                    }
                    Err(_) => {
                        error!("Lock of '{}' is poisoned, stop flushing", path.display());
                        break;
                    }
                },
                _ => break,
            }
        }
        debug!("Flush thread of {} stopped", path.display());
    }

    fn not_ready(&self) -> LogboardError {
        LogboardError::WriterNotReady(self.path.display().to_string())
    }
}

impl EventWriter for AsyncFileWriter {
    fn write(&mut self, event: &Event) -> Result<usize> {
        if self.stop.is_none() {
            return Err(self.not_ready());
        }

        let payload = event.encode();
        if payload.is_empty() {
            return Err(LogboardError::EmptyRecord);
        }
        let frame = frame_record(&payload);

        let mut guard = self
            .file
            .lock()
            .map_err(|_| LogboardError::LockPoisoned("event file"))?;
        match guard.as_mut() {
            Some(file) => match file.write_all(&frame) {
                Ok(()) => Ok(frame.len()),
                Err(e) => {
                    error!("Failed to write record to '{}': {}", self.path.display(), e);
                    self.healthy = false;
                    Err(e.into())
                }
            },
            None => Err(self.not_ready()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if self.stop.is_none() {
            return Err(self.not_ready());
        }

        let mut guard = self
            .file
            .lock()
            .map_err(|_| LogboardError::LockPoisoned("event file"))?;
        match guard.as_mut() {
            Some(file) => Ok(file.flush()?),
            None => Err(self.not_ready()),
        }
    }

    fn close(&mut self) -> Result<()> {
        let res = match self.stop.take() {
            Some(stop) => {
                // The loop also stops when the sender is dropped
                let _ = stop.send(());

                let file = self
                    .file
                    .lock()
                    .map_err(|_| LogboardError::LockPoisoned("event file"))?
                    .take();
                match file {
                    Some(mut file) => file.flush().map_err(LogboardError::from),
                    None => Ok(()),
                }
            }
            None => Ok(()),
        };

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Flush thread of '{}' panicked", self.path.display());
            }
        }

        if res.is_ok() {
            debug!("Closed event file {}", self.path.display());
        }
        res
    }

    fn ready(&self) -> bool {
        self.healthy
            && self.stop.is_some()
            && self
                .file
                .lock()
                .map(|guard| guard.is_some())
                .unwrap_or(false)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AsyncFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!("Failed to close '{}': {}", self.path.display(), e);
        }
    }
}
