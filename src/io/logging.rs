use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Log file name inside the app home
pub const LOG_FILE: &str = "tdb.log";
/// Environment variable that overrides the configured log filter
pub const LOG_ENV: &str = "TDB_LOG";

/// Path of the log file for an app home
pub fn log_path(home: &Path) -> PathBuf {
    home.join(LOG_FILE)
}

/// Build the filter: `$TDB_LOG` if set and valid, else `level`, else `info`
pub fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Route `tracing` output to `<home>/tdb.log`. The terminal belongs to the
/// TUI, so nothing is written to stdout or stderr.
pub fn init_logging(home: &Path, level: &str) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(home)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path(home))?;
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| e as Box<dyn std::error::Error>)?;
    Ok(())
}
