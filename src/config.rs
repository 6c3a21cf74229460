//! ember - Engine Configuration
//! Defines tunable parameters for the store.

use std::path::PathBuf;

/// File name of the append-only command log.
pub const LOG_FILE_NAME: &str = "data.db";

/// Configuration for the ember engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the command log.
    pub data_dir: PathBuf,

    /// Whether to fsync the command log after every appended record.
    pub sync_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            sync_writes: true,
        }
    }
}

impl Config {
    /// Create a new Config with a custom data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Path of the command log inside the data directory.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }

    /// Ensure the data directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}
