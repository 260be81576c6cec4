//! Host, time and path utilities.
use chrono::{Local, Utc};
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

/// Fallback used when the host name cannot be resolved.
const UNKNOWN_HOST: &str = "localhost";

/// Returns the name of the local host.
///
/// The value is looked up from `HOSTNAME`, then `/etc/hostname`. It is meant to be
/// resolved once and passed to the writers, not queried per file.
pub fn hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    match fs::read_to_string("/etc/hostname") {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => {
            log::warn!("Failed to resolve host name, using '{}'", UNKNOWN_HOST);
            UNKNOWN_HOST.to_string()
        }
    }
}

/// Returns seconds since epoch with microsecond precision.
pub fn timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Returns the path of an event file for `prefix`.
///
/// The name is `{prefix}.out.tfevents.{timestamp}.{hostname}`, where the timestamp
/// has microsecond precision.
pub fn event_file_path(prefix: &Path, timestamp: f64, hostname: &str) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(format!(".out.tfevents.{:.6}.{}", timestamp, hostname));
    PathBuf::from(path)
}

/// Returns a log directory named after the current local time and the host,
/// e.g. `runs/Oct16_09-30-12_myhost`.
pub fn default_log_dir(hostname: &str) -> PathBuf {
    let now = Local::now().format("%b%d_%H-%M-%S");
    Path::new("runs").join(format!("{}_{}", now, hostname))
}

/// Creates `dir` and its parents if it does not exist.
///
/// Fails if `dir` exists and is not a directory.
pub fn make_dirs(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    if dir.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("'{}' exists and is not a directory", dir.display()),
        ));
    }

    fs::create_dir_all(dir)?;
    log::info!("Created log dir: {}", dir.display());
    Ok(())
}
