//! ember - Append-Only Command Log
//! Provides durability by recording every applied mutation as a
//! textual record, flushed to disk before the caller sees a response.
//! Replaying the log from an empty store reproduces the live state.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{EmberError, Result};

use super::store::Store;

/// Append-only log of committed mutations.
///
/// ## Record format (one per line)
/// ```text
/// SET <key> <value>
/// DEL <key>
/// EXPIRE <key> <instant>    instant: JSON-encoded RFC3339, absolute
/// PERSIST <key>
/// ```
/// EXPIRE records carry an absolute instant rather than a relative TTL
/// so that replay is idempotent regardless of when it runs.
pub struct Journal {
    /// Path to the log file on disk.
    path: PathBuf,
    /// File handle opened for appending.
    file: File,
    /// Whether to fsync after each appended record.
    sync_writes: bool,
}

impl Journal {
    /// Open or create the log file at the specified path.
    pub fn open(path: impl Into<PathBuf>, sync_writes: bool) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            sync_writes,
        })
    }

    /// Returns the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a SET record.
    pub fn append_set(&mut self, key: &str, value: &str) -> Result<()> {
        self.append_line(&format!("SET {key} {value}"))
    }

    /// Append a DEL record.
    pub fn append_del(&mut self, key: &str) -> Result<()> {
        self.append_line(&format!("DEL {key}"))
    }

    /// Append an EXPIRE record carrying the absolute expiry instant.
    pub fn append_expire(&mut self, key: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let instant = serde_json::to_string(&expires_at)
            .map_err(|e| EmberError::Serialization(e.to_string()))?;
        self.append_line(&format!("EXPIRE {key} {instant}"))
    }

    /// Append a PERSIST record.
    pub fn append_persist(&mut self, key: &str) -> Result<()> {
        self.append_line(&format!("PERSIST {key}"))
    }

    /// Write one record and flush it to disk. The record must be
    /// durable before the corresponding response is returned.
    fn append_line(&mut self, record: &str) -> Result<()> {
        self.file.write_all(record.as_bytes())?;
        self.file.write_all(b"\n")?;
        if self.sync_writes {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Rebuild a store by replaying the log at `path` in record order.
    /// A missing file yields an empty store. Malformed records are
    /// skipped and replay continues; this is the declared recovery
    /// policy, not an error.
    pub fn replay(path: &Path) -> Result<Store> {
        let mut store = Store::new();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(store),
            Err(e) => return Err(e.into()),
        };

        let mut skipped = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| EmberError::RecoveryFailed(e.to_string()))?;
            if !apply_record(&mut store, &line) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::warn!("skipped {skipped} malformed records while replaying {path:?}");
        }
        Ok(store)
    }
}

/// Apply one log record to the store, using the same update rules as
/// direct writes. Returns false if the record is malformed.
fn apply_record(store: &mut Store, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let (Some(verb), Some(key)) = (parts.next(), parts.next()) else {
        return false;
    };
    match verb {
        "SET" => match parts.next() {
            Some(value) => {
                store.set(key.to_owned(), value.to_owned(), None);
                true
            }
            None => false,
        },
        "DEL" => {
            store.del(key);
            true
        }
        "EXPIRE" => {
            let instant = parts
                .next()
                .and_then(|tok| serde_json::from_str::<DateTime<Utc>>(tok).ok());
            match instant {
                // The recorded instant may already be in the past; lazy
                // expiry treats the key as gone on the next read.
                Some(at) => {
                    store.set_expiry(key, Some(at));
                    true
                }
                None => false,
            }
        }
        "PERSIST" => {
            store.set_expiry(key, None);
            true
        }
        _ => false,
    }
}
