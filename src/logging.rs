//! Log file setup
//!
//! The terminal is owned by the TUI, so tracing output goes to a file.
//! Verbosity follows `RUST_LOG` and defaults to `info`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

/// Default log file name inside the cache directory
pub const LOG_FILE_NAME: &str = "skycast.log";

/// Default log path (`~/.cache/skycast/skycast.log` on Linux)
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "skycast")?;
    Some(project_dirs.cache_dir().join(LOG_FILE_NAME))
}

/// Opens the log file for appending, creating parent directories
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global tracing subscriber writing to `path`
///
/// Returns the path in use, or `None` when logging stays disabled (no path
/// could be determined, the file could not be opened, or a subscriber was
/// already installed).
pub fn init(path: Option<PathBuf>) -> Option<PathBuf> {
    let path = path.or_else(default_log_path)?;
    let file = open_log_file(&path).ok()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(path)
}
