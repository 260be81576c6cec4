//! The recorder routing summaries to event writers.
mod records;

use crate::{
    config::{RecorderConfig, WriterKind},
    projector::Projector,
};
use log::{error, info};
use logboard_core::{
    codec,
    summary::{self, AudioMetadata, Colorspace, ImageMetadata, DEFAULT_MAX_COLS},
    proto, util, AsyncFileWriter, Event, EventWriter, FileWriter, LogboardError, Result,
};
use std::{
    collections::{hash_map::Entry, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

/// File name prefix of event files in a log directory.
pub const EVENT_FILE_PREFIX: &str = "events";

/// Creates an event writer from a file name prefix and a host name.
pub type WriterFactory = Box<dyn Fn(&Path, &str) -> Box<dyn EventWriter> + Send + Sync>;

type SharedWriter = Mutex<Box<dyn EventWriter>>;

/// Returns a factory of writers of the given kind.
pub fn writer_factory(kind: WriterKind, resume: bool, flush_secs: u64) -> WriterFactory {
    match kind {
        WriterKind::Sync => Box::new(
            move |prefix: &Path, hostname: &str| -> Box<dyn EventWriter> {
                Box::new(FileWriter::new(prefix, hostname, resume))
            },
        ),
        WriterKind::Async => {
            let interval = Duration::from_secs(flush_secs);
            Box::new(
                move |prefix: &Path, hostname: &str| -> Box<dyn EventWriter> {
                    Box::new(AsyncFileWriter::new(prefix, hostname, resume, interval))
                },
            )
        }
    }
}

/// Records typed summaries into TensorBoard event files.
///
/// Summaries go to the root writer in the log directory, except for
/// [`add_scalars`](Recorder::add_scalars), which writes each series into its own
/// directory so that TensorBoard overlays them in one chart.
///
/// Every `add_*` method returns the number of bytes written. Failures are logged and
/// returned as errors; nothing is written for invalid input.
///
/// ```no_run
/// use logboard::Recorder;
///
/// # fn main() -> logboard_core::Result<()> {
/// let recorder = Recorder::new("runs/exp1");
/// for step in 0..100 {
///     recorder.add_scalar("train/loss", 1.0 / (step + 1) as f32, step)?;
/// }
/// recorder.add_text("notes", "finished", 100)?;
/// # Ok(())
/// # }
/// ```
pub struct Recorder {
    log_dir: PathBuf,
    hostname: String,
    make_writer: WriterFactory,
    root: Option<SharedWriter>,

    // Writers of add_scalars, keyed by directory.
    branches: Mutex<HashMap<PathBuf, Box<dyn EventWriter>>>,

    projector: Projector,
    max_cols: usize,
    sanitize_tags: bool,
}

impl Recorder {
    /// Creates a recorder with synchronous writers in `log_dir`.
    ///
    /// See [`RecorderConfig::log_dir`] for the handling of an empty path.
    pub fn new(log_dir: impl AsRef<Path>) -> Self {
        Self::from_config(&RecorderConfig::default().log_dir(log_dir))
    }

    /// Creates a recorder whose writers are created by `make_writer`.
    pub fn with_factory(log_dir: impl AsRef<Path>, make_writer: WriterFactory) -> Self {
        Self::build(log_dir.as_ref(), make_writer, DEFAULT_MAX_COLS, false)
    }

    /// Creates a recorder from a configuration.
    pub fn from_config(config: &RecorderConfig) -> Self {
        let make_writer = writer_factory(config.writer, config.resume, config.flush_secs);
        Self::build(
            &config.log_dir,
            make_writer,
            config.max_cols,
            config.sanitize_tags,
        )
    }

    fn build(
        log_dir: &Path,
        make_writer: WriterFactory,
        max_cols: usize,
        sanitize_tags: bool,
    ) -> Self {
        let hostname = util::hostname();
        let log_dir = resolve_log_dir(log_dir, &hostname);
        let root = if log_dir.is_dir() {
            let writer = make_writer(&log_dir.join(EVENT_FILE_PREFIX), &hostname);
            info!("Recording to {}", writer.path().display());
            Some(Mutex::new(writer))
        } else {
            None
        };

        Self {
            projector: Projector::new(&log_dir),
            log_dir,
            hostname,
            make_writer,
            root,
            branches: Mutex::new(HashMap::new()),
            max_cols,
            sanitize_tags,
        }
    }

    /// Root directory of the event files.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Returns `true` if the root writer exists and is ready.
    pub fn ready(&self) -> bool {
        self.root
            .as_ref()
            .and_then(|w| w.lock().ok().map(|w| w.ready()))
            .unwrap_or(false)
    }

    /// Path of the root event file, if the root writer exists.
    pub fn event_file(&self) -> Option<PathBuf> {
        self.root
            .as_ref()
            .and_then(|w| w.lock().ok().map(|w| w.path().to_path_buf()))
    }

    /// Records a scalar.
    pub fn add_scalar(&self, tag: &str, value: f32, step: i64) -> Result<usize> {
        let root = self.root()?;
        write_event(root, summary::scalar(&self.tag(tag), value), step)
    }

    /// Records several scalars under `main_tag`, one series per sub tag.
    ///
    /// The value of `sub_tag` goes to a writer in `{log_dir}/{main_tag}_{sub_tag}`,
    /// with `/` in `main_tag` replaced by `_`. The directory and its writer are created
    /// on first use. Every value is attempted; if any fails, the first error is
    /// returned after the others have been written.
    pub fn add_scalars<K, I>(&self, main_tag: &str, tag_values: I, step: i64) -> Result<usize>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f32)>,
    {
        let tag = self.tag(main_tag);
        let prefix = main_tag.replace('/', "_");
        let mut branches = self
            .branches
            .lock()
            .map_err(|_| LogboardError::LockPoisoned("scalar writers"))?;

        let mut total = 0;
        let mut failure = None;
        for (sub_tag, value) in tag_values {
            let dir = self
                .log_dir
                .join(format!("{}_{}", prefix, sub_tag.as_ref()));
            let res = self.branch(&mut branches, dir).and_then(|writer| {
                writer.write(&Event::with_step(summary::scalar(&tag, value), step))
            });
            match res {
                Ok(n) => total += n,
                Err(e) => {
                    error!("Failed to add {}/{}: {}", main_tag, sub_tag.as_ref(), e);
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }

    /// Records a histogram of `values` over the default buckets.
    pub fn add_histogram(&self, tag: &str, values: &[f64], step: i64) -> Result<usize> {
        let root = self.root()?;
        write_event(root, summary::histogram(&self.tag(tag), values), step)
    }

    /// Records a histogram from precomputed statistics.
    #[allow(clippy::too_many_arguments)]
    pub fn add_histogram_raw(
        &self,
        tag: &str,
        min: f64,
        max: f64,
        num: f64,
        sum: f64,
        sum_squares: f64,
        bucket_limits: &[f64],
        bucket_counts: &[f64],
        step: i64,
    ) -> Result<usize> {
        let root = self.root()?;
        let summary = summary::histogram_raw(
            &self.tag(tag),
            min,
            max,
            num,
            sum,
            sum_squares,
            bucket_limits,
            bucket_counts,
        )?;
        write_event(root, summary, step)
    }

    /// Records an encoded image.
    pub fn add_image(
        &self,
        tag: &str,
        encoded_image: &[u8],
        meta: &ImageMetadata,
        step: i64,
    ) -> Result<usize> {
        let root = self.root()?;
        let summary = summary::image(&self.tag(tag), encoded_image, meta)?;
        write_event(root, summary, step)
    }

    /// Records an image file as is, after decoding it once to learn its size.
    pub fn add_image_file(&self, tag: &str, path: impl AsRef<Path>, step: i64) -> Result<usize> {
        let root = self.root()?;
        let path = path.as_ref();
        let encoded = fs::read(path).map_err(|e| {
            error!("Failed to read image '{}': {}", path.display(), e);
            e
        })?;

        let raw = codec::load_from_memory(&encoded)?;
        let colorspace = Colorspace::from_channels(raw.channels).ok_or_else(|| {
            LogboardError::InvalidImage(format!("{} channels", raw.channels))
        })?;
        let meta = ImageMetadata::new(raw.width as i32, raw.height as i32, colorspace as i32)?;

        let summary = summary::image(&self.tag(tag), &encoded, &meta)?;
        write_event(root, summary, step)
    }

    /// Records equally sized raw images as a single mosaic.
    ///
    /// See [`summary::compose_mosaic`] for the layout.
    pub fn add_images<T: AsRef<[u8]>>(
        &self,
        tag: &str,
        images: &[T],
        meta: &ImageMetadata,
        step: i64,
    ) -> Result<usize> {
        let root = self.root()?;
        let summary = summary::images(&self.tag(tag), images, meta, self.max_cols)?;
        write_event(root, summary, step)
    }

    /// Records an encoded audio clip.
    pub fn add_audio(
        &self,
        tag: &str,
        encoded_audio: &[u8],
        meta: &AudioMetadata,
        step: i64,
    ) -> Result<usize> {
        let root = self.root()?;
        let summary = summary::audio(&self.tag(tag), encoded_audio, meta)?;
        write_event(root, summary, step)
    }

    /// Records a text.
    pub fn add_text(&self, tag: &str, text: &str, step: i64) -> Result<usize> {
        let root = self.root()?;
        write_event(root, summary::text(&self.tag(tag), text), step)
    }

    /// Records an `n_points x dim` row-major matrix for the embedding projector.
    ///
    /// `labels` is either empty or holds one label per point. Returns the length of
    /// the block appended to the projector config. See [`Projector`] for the files.
    pub fn add_embedding<S: AsRef<str>>(
        &self,
        matrix: &[f32],
        n_points: usize,
        dim: usize,
        labels: &[S],
        step: i64,
        tag: &str,
    ) -> Result<usize> {
        self.root()?;
        self.projector
            .add_embedding(matrix, n_points, dim, labels, step, &self.tag(tag))
    }

    /// Closes all writers. Later calls to `add_*` fail.
    ///
    /// Every writer is closed even if some fail; the first error is returned.
    pub fn close(&self) -> Result<()> {
        let mut failure = None;
        if let Some(root) = self.root.as_ref() {
            let res = root
                .lock()
                .map_err(|_| LogboardError::LockPoisoned("root writer"))
                .and_then(|mut w| w.close());
            if let Err(e) = res {
                error!("Failed to close root writer: {}", e);
                failure.get_or_insert(e);
            }
        }

        match self.branches.lock() {
            Ok(mut branches) => {
                for (dir, writer) in branches.iter_mut() {
                    if let Err(e) = writer.close() {
                        error!("Failed to close writer in '{}': {}", dir.display(), e);
                        failure.get_or_insert(e);
                    }
                }
            }
            Err(_) => {
                failure.get_or_insert(LogboardError::LockPoisoned("scalar writers"));
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn root(&self) -> Result<&SharedWriter> {
        self.root.as_ref().ok_or_else(|| {
            error!("No event writer in '{}'", self.log_dir.display());
            LogboardError::WriterNotReady(self.log_dir.display().to_string())
        })
    }

    fn tag(&self, tag: &str) -> String {
        if self.sanitize_tags {
            summary::sanitize_tag(tag)
        } else {
            summary::clean_tag(tag)
        }
    }

    /// Returns the writer of `dir`, creating the directory and the writer if needed.
    fn branch<'a>(
        &self,
        branches: &'a mut HashMap<PathBuf, Box<dyn EventWriter>>,
        dir: PathBuf,
    ) -> Result<&'a mut Box<dyn EventWriter>> {
        let dir = if branches.contains_key(&dir) {
            dir
        } else {
            resolve_dir(dir)
        };

        match branches.entry(dir) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                if !entry.key().is_dir() {
                    return Err(LogboardError::WriterNotReady(
                        entry.key().display().to_string(),
                    ));
                }
                let prefix = entry.key().join(EVENT_FILE_PREFIX);
                let writer = (self.make_writer)(&prefix, &self.hostname);
                Ok(entry.insert(writer))
            }
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!("Failed to close recorder of '{}': {}", self.log_dir.display(), e);
        }
    }
}

fn write_event(writer: &SharedWriter, summary: proto::Summary, step: i64) -> Result<usize> {
    let event = Event::with_step(summary, step);
    let mut writer = writer
        .lock()
        .map_err(|_| LogboardError::LockPoisoned("root writer"))?;
    writer.write(&event)
}

/// Substitutes the default directory for a blank path and resolves it.
fn resolve_log_dir(log_dir: &Path, hostname: &str) -> PathBuf {
    let blank = log_dir
        .to_str()
        .map(|s| s.trim().is_empty())
        .unwrap_or(false);
    if blank {
        resolve_dir(util::default_log_dir(hostname))
    } else {
        resolve_dir(log_dir.to_path_buf())
    }
}

/// Returns the parent of `dir` if it is a file, otherwise `dir`, created if missing.
///
/// A failure to create the directory is logged. Writers are not created in a
/// missing directory.
fn resolve_dir(dir: PathBuf) -> PathBuf {
    if dir.exists() {
        if dir.is_dir() {
            dir
        } else {
            match dir.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            }
        }
    } else {
        if let Err(e) = util::make_dirs(&dir) {
            error!("Failed to create log dir '{}': {}", dir.display(), e);
        }
        dir
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_resolve_dir() -> std::io::Result<()> {
        let tmp = TempDir::new("recorder")?;
        let file = tmp.path().join("file.txt");
        fs::write(&file, b"x")?;
        assert_eq!(resolve_dir(file), tmp.path());

        let nested = tmp.path().join("a/b");
        assert_eq!(resolve_dir(nested.clone()), nested);
        assert!(nested.is_dir());
        Ok(())
    }

    #[test]
    fn test_missing_log_dir() {
        let recorder = Recorder::new("/proc/nonexistent/logboard");
        assert!(!recorder.ready());
        assert!(recorder.event_file().is_none());
        assert!(matches!(
            recorder.add_scalar("loss", 1.0, 0),
            Err(LogboardError::WriterNotReady(_))
        ));
        let no_labels: [&str; 0] = [];
        assert!(recorder
            .add_embedding(&[1.0], 1, 1, &no_labels, 0, "default")
            .is_err());
    }
}
