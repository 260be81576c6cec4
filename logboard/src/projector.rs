//! Side files of the embedding projector.
//!
//! Each embedding is stored under `{log_dir}/{step:05}/{tag}/` as `tensors.tsv` with
//! one point per line and, if labels are given, `metadata.tsv` with one label per
//! line. Every embedding is then registered by appending a block to
//! `{log_dir}/projector_config.pbtxt`:
//!
//! ```text
//! embeddings {
//!   tensor_name: "default:00003"
//!   tensor_path: "00003/default/tensors.tsv"
//!   metadata_path: "00003/default/metadata.tsv"
//! }
//! ```
use logboard_core::{util, LogboardError, Result};
use log::error;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Name of the projector config file.
pub const PROJECTOR_CONFIG: &str = "projector_config.pbtxt";

const TENSORS_FILE: &str = "tensors.tsv";
const METADATA_FILE: &str = "metadata.tsv";

/// Writes embedding side files under a log directory.
pub struct Projector {
    log_dir: PathBuf,

    // Serializes appends to the projector config.
    config: Mutex<()>,
}

impl Projector {
    /// Creates a projector writing under `log_dir`.
    pub fn new(log_dir: impl AsRef<Path>) -> Self {
        Self {
            log_dir: log_dir.as_ref().to_path_buf(),
            config: Mutex::new(()),
        }
    }

    /// Path of the projector config.
    pub fn config_path(&self) -> PathBuf {
        self.log_dir.join(PROJECTOR_CONFIG)
    }

    /// Writes an `n_points x dim` row-major matrix and its optional labels, then
    /// registers them in the projector config.
    ///
    /// All sizes are checked before anything is written. A negative `step` is
    /// treated as 0. Returns the length of the appended config block.
    pub fn add_embedding<S: AsRef<str>>(
        &self,
        matrix: &[f32],
        n_points: usize,
        dim: usize,
        labels: &[S],
        step: i64,
        tag: &str,
    ) -> Result<usize> {
        if matrix.len() != n_points * dim {
            error!(
                "Invalid data size: {} != {} * {}",
                matrix.len(),
                n_points,
                dim
            );
            return Err(LogboardError::InvalidEmbedding(format!(
                "matrix has {} elements, expected {} * {}",
                matrix.len(),
                n_points,
                dim
            )));
        }
        if !labels.is_empty() && labels.len() != n_points {
            error!(
                "Number of labels ({}) differs from number of points ({})",
                labels.len(),
                n_points
            );
            return Err(LogboardError::InvalidEmbedding(format!(
                "{} labels for {} points",
                labels.len(),
                n_points
            )));
        }

        let subdir = format!("{:05}/{}", step.max(0), tag);
        let save_path = self.log_dir.join(&subdir);
        util::make_dirs(&save_path).map_err(|e| {
            error!("Failed to create '{}': {}", save_path.display(), e);
            e
        })?;

        if !labels.is_empty() {
            let lines = labels.iter().map(|l| l.as_ref().to_string());
            write_lines(&save_path.join(METADATA_FILE), lines)?;
        }

        let rows = (0..n_points).map(|i| {
            matrix[i * dim..(i + 1) * dim]
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\t")
        });
        write_lines(&save_path.join(TENSORS_FILE), rows)?;

        let metadata = if labels.is_empty() {
            None
        } else {
            Some(METADATA_FILE)
        };
        self.append_config(tag, &subdir, metadata, step.max(0))
    }

    fn append_config(
        &self,
        tag: &str,
        subdir: &str,
        metadata: Option<&str>,
        step: i64,
    ) -> Result<usize> {
        let mut block = "embeddings {\n".to_string();
        block.push_str(&format!("  tensor_name: \"{}:{:05}\"\n", tag, step));
        block.push_str(&format!("  tensor_path: \"{}/{}\"\n", subdir, TENSORS_FILE));
        if let Some(metadata) = metadata {
            block.push_str(&format!("  metadata_path: \"{}/{}\"\n", subdir, metadata));
        }
        block.push_str("}\n");

        let path = self.config_path();
        let _guard = self
            .config
            .lock()
            .map_err(|_| LogboardError::LockPoisoned("projector config"))?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(block.as_bytes()))
            .map_err(|e| {
                error!("Failed to append to projector config '{}': {}", path.display(), e);
                e
            })?;

        Ok(block.len())
    }
}

fn write_lines(path: &Path, lines: impl Iterator<Item = String>) -> Result<()> {
    let res = File::create(path).and_then(|file| {
        let mut file = BufWriter::new(file);
        for line in lines {
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.flush()
    });

    res.map_err(|e| {
        error!("Failed to write '{}': {}", path.display(), e);
        e.into()
    })
}
