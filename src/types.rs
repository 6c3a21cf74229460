//! ember - Core Type Definitions
//! Defines fundamental types used across the store.

use chrono::{DateTime, Utc};

/// Key type for the store.
/// Keys are opaque text tokens, ordered by byte comparison.
pub type Key = String;

/// Value type for the store.
/// Values are opaque text tokens (the line protocol cannot carry whitespace).
pub type Value = String;

/// A single entry stored under a key.
/// `expires_at` is an absolute instant; `None` means the entry never expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: Value,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create an entry with no expiry.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Returns true if the entry is expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// A buffered write intention recorded while a transaction is active.
/// The buffer keeps at most one op per key; queuing a later op for the
/// same key replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Overwrite the value and clear any expiry.
    Set { value: Value },
    /// Remove the key.
    Del,
    /// Attach (or replace) an expiry on an existing key.
    Expire { expires_at: DateTime<Utc> },
    /// Clear the expiry on an existing key.
    Persist,
}

/// Remaining time-to-live of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key is absent or expired. Rendered as `-2` on the wire.
    NoKey,
    /// The key exists and carries no expiry. Rendered as `-1`.
    NoTtl,
    /// The key expires in this many milliseconds (never negative).
    Millis(i64),
}
