//! Configuration of [`Recorder`](crate::Recorder).
use anyhow::Result;
use logboard_core::{summary::DEFAULT_MAX_COLS, DEFAULT_FLUSH_SECS};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Kind of the event writers created by a [`Recorder`](crate::Recorder).
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum WriterKind {
    /// [`FileWriter`](logboard_core::FileWriter), flushing after every record.
    Sync,

    /// [`AsyncFileWriter`](logboard_core::AsyncFileWriter), flushing every
    /// [`RecorderConfig::flush_secs`] seconds.
    Async,
}

impl Default for WriterKind {
    fn default() -> Self {
        WriterKind::Sync
    }
}

/// Configuration of [`Recorder`](crate::Recorder).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct RecorderConfig {
    /// Root directory of the event files.
    ///
    /// If empty, `runs/{%b%d_%H-%M-%S}_{hostname}` is used.
    pub log_dir: PathBuf,

    /// Kind of the event writers.
    pub writer: WriterKind,

    /// Interval of the background flush of asynchronous writers, in seconds.
    pub flush_secs: u64,

    /// If `true`, existing event files are appended to instead of truncated.
    pub resume: bool,

    /// Maximum number of columns of image mosaics.
    pub max_cols: usize,

    /// If `true`, tags are restricted to `[A-Za-z0-9._/-]`.
    pub sanitize_tags: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::new(),
            writer: WriterKind::Sync,
            flush_secs: DEFAULT_FLUSH_SECS,
            resume: false,
            max_cols: DEFAULT_MAX_COLS,
            sanitize_tags: false,
        }
    }
}

impl RecorderConfig {
    /// Sets the root directory of the event files.
    pub fn log_dir(mut self, v: impl AsRef<Path>) -> Self {
        self.log_dir = v.as_ref().to_path_buf();
        self
    }

    /// Sets the kind of the event writers.
    pub fn writer(mut self, v: WriterKind) -> Self {
        self.writer = v;
        self
    }

    /// Sets the flush interval of asynchronous writers in seconds.
    pub fn flush_secs(mut self, v: u64) -> Self {
        self.flush_secs = v;
        self
    }

    /// Sets whether existing event files are appended to.
    pub fn resume(mut self, v: bool) -> Self {
        self.resume = v;
        self
    }

    /// Sets the maximum number of columns of image mosaics.
    pub fn max_cols(mut self, v: usize) -> Self {
        self.max_cols = v;
        self
    }

    /// Sets whether tags are sanitized.
    pub fn sanitize_tags(mut self, v: bool) -> Self {
        self.sanitize_tags = v;
        self
    }

    /// Constructs [`RecorderConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RecorderConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_recorder_config() -> Result<()> {
        let config = RecorderConfig::default()
            .log_dir("runs/exp1")
            .writer(WriterKind::Async)
            .flush_secs(5)
            .resume(true)
            .max_cols(4)
            .sanitize_tags(true);

        let dir = TempDir::new("recorder_config")?;
        let path = dir.path().join("recorder_config.yaml");
        config.save(&path)?;
        let config_ = RecorderConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_missing_fields_take_defaults() -> Result<()> {
        let config: RecorderConfig = serde_yaml::from_str("log_dir: runs/exp2\nwriter: Async\n")?;
        assert_eq!(config.log_dir, PathBuf::from("runs/exp2"));
        assert_eq!(config.writer, WriterKind::Async);
        assert_eq!(config.flush_secs, 120);
        assert_eq!(config.max_cols, 8);
        assert!(!config.resume);
        assert!(!config.sanitize_tags);
        Ok(())
    }
}
