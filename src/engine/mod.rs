//! ember - Engine Module
//! The command dispatcher at the center of the store. The engine owns
//! the ordered store, the command log, and the transaction buffer, and
//! is their only reader and writer.
//!
//! Per request it validates arguments, routes reads through the
//! transaction overlay and then the store, routes writes either
//! directly (store, then log) or into the buffer, and drives
//! BEGIN/COMMIT/ABORT.

pub mod journal;
pub mod metrics;
pub mod store;
pub mod txn;

use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::error::Result;
use crate::types::{Ttl, WriteOp};

use self::journal::Journal;
use self::metrics::EngineMetrics;
use self::store::Store;
use self::txn::TxnBuffer;

/// Response to a single command: one line for most verbs, several for
/// MGET and RANGE. Error lines start with `ERR `.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Line(String),
    Lines(Vec<String>),
}

impl Reply {
    fn ok() -> Self {
        Reply::Line("OK".to_owned())
    }

    fn line(text: impl Into<String>) -> Self {
        Reply::Line(text.into())
    }

    fn err(msg: impl std::fmt::Display) -> Self {
        Reply::Line(format!("ERR {msg}"))
    }

    fn wrong_arity(verb: &str) -> Self {
        Reply::Line(format!("ERR wrong number of arguments for {verb}"))
    }

    /// The response lines, in emission order.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            Reply::Line(line) => vec![line],
            Reply::Lines(lines) => lines,
        }
    }
}

/// The core ember engine.
/// Coordinates the store, the transaction buffer, and the command log
/// so that every query gets a single answer regardless of where the
/// key currently lives.
pub struct Engine {
    /// In-memory ordered store, rebuilt from the log at startup.
    store: Store,
    /// Append-only command log; the sole source of truth on restart.
    journal: Journal,
    /// Active transaction buffer, if a transaction is in progress.
    txn: Option<TxnBuffer>,
    /// Operation counters.
    metrics: EngineMetrics,
}

impl Engine {
    /// Open or create an engine at the configured path. An existing
    /// command log is replayed to recover state.
    pub fn open(config: Config) -> Result<Self> {
        config.ensure_dirs()?;
        let path = config.log_path();

        let store = Journal::replay(&path)?;
        let journal = Journal::open(&path, config.sync_writes)?;

        log::info!(
            "ember engine opened at {:?} ({} keys recovered)",
            journal.path(),
            store.len()
        );

        Ok(Self {
            store,
            journal,
            txn: None,
            metrics: EngineMetrics::new(),
        })
    }

    /// The engine's operation counters.
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Whether a transaction is currently active.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Execute one request line and produce its response. Verbs are
    /// case-insensitive; keys and values are case-sensitive.
    pub fn execute(&mut self, input: &str) -> Reply {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((&verb, args)) = parts.split_first() else {
            return Reply::line("");
        };

        let verb = verb.to_ascii_uppercase();
        match verb.as_str() {
            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "DEL" => self.cmd_del(args),
            "EXISTS" => self.cmd_exists(args),
            "MSET" => self.cmd_mset(args),
            "MGET" => self.cmd_mget(args),
            "EXPIRE" => self.cmd_expire(args),
            "TTL" => self.cmd_ttl(args),
            "PERSIST" => self.cmd_persist(args),
            "RANGE" => self.cmd_range(args),
            "BEGIN" => self.cmd_begin(),
            "COMMIT" => self.cmd_commit(),
            "ABORT" => self.cmd_abort(),
            "EXIT" => Reply::ok(),
            _ => Reply::err(format!("unknown command '{verb}'")),
        }
    }

    fn cmd_set(&mut self, args: &[&str]) -> Reply {
        if args.len() < 2 {
            return Reply::wrong_arity("SET");
        }
        let (key, value) = (args[0], args[1]);
        self.metrics.record_set();

        if let Some(buffer) = self.txn.as_mut() {
            buffer.queue(key, WriteOp::Set { value: value.to_owned() });
            return Reply::ok();
        }

        self.store.set(key.to_owned(), value.to_owned(), None);
        Self::flush_direct(self.journal.append_set(key, value), Reply::ok())
    }

    fn cmd_get(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::wrong_arity("GET");
        }
        self.metrics.record_get();
        match self.read_value(args[0], Utc::now()) {
            Some(value) => Reply::line(value.to_owned()),
            None => Reply::line("nil"),
        }
    }

    fn cmd_del(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::wrong_arity("DEL");
        }
        let key = args[0];
        self.metrics.record_del();

        if let Some(buffer) = self.txn.as_mut() {
            // Queued deletes report success without an existence check.
            buffer.queue(key, WriteOp::Del);
            return Reply::line("1");
        }

        if !self.store.del(key) {
            return Reply::line("0");
        }
        Self::flush_direct(self.journal.append_del(key), Reply::line("1"))
    }

    fn cmd_exists(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::wrong_arity("EXISTS");
        }
        self.metrics.record_get();
        let present = self.key_exists(args[0], Utc::now());
        Reply::line(if present { "1" } else { "0" })
    }

    fn cmd_mset(&mut self, args: &[&str]) -> Reply {
        if args.len() < 2 || args.len() % 2 != 0 {
            return Reply::wrong_arity("MSET");
        }

        if let Some(buffer) = self.txn.as_mut() {
            for pair in args.chunks(2) {
                self.metrics.record_set();
                buffer.queue(pair[0], WriteOp::Set { value: pair[1].to_owned() });
            }
            return Reply::ok();
        }

        for pair in args.chunks(2) {
            self.metrics.record_set();
            self.store.set(pair[0].to_owned(), pair[1].to_owned(), None);
            if let Err(e) = self.journal.append_set(pair[0], pair[1]) {
                log::error!("command log append failed: {e}");
                return Reply::err("write failed");
            }
        }
        Reply::ok()
    }

    fn cmd_mget(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            // One ERR line preserves the command's single-response shape.
            return Reply::wrong_arity("MGET");
        }
        let now = Utc::now();
        let lines = args
            .iter()
            .map(|&key| {
                self.metrics.record_get();
                match self.read_value(key, now) {
                    Some(value) => value.to_owned(),
                    None => "nil".to_owned(),
                }
            })
            .collect();
        Reply::Lines(lines)
    }

    fn cmd_expire(&mut self, args: &[&str]) -> Reply {
        if args.len() < 2 {
            return Reply::wrong_arity("EXPIRE");
        }
        let key = args[0];
        let Ok(ms) = args[1].parse::<i64>() else {
            return Reply::err("invalid milliseconds");
        };
        self.metrics.record_expire();

        let now = Utc::now();
        if !self.key_exists(key, now) {
            return Reply::line("0");
        }

        if ms <= 0 {
            // A non-positive expiry deletes immediately and logs as DEL.
            if let Some(buffer) = self.txn.as_mut() {
                buffer.queue(key, WriteOp::Del);
                return Reply::line("1");
            }
            self.store.del(key);
            return Self::flush_direct(self.journal.append_del(key), Reply::line("1"));
        }

        let Some(expires_at) = now.checked_add_signed(Duration::milliseconds(ms)) else {
            return Reply::err("invalid milliseconds");
        };

        if let Some(buffer) = self.txn.as_mut() {
            buffer.queue(key, WriteOp::Expire { expires_at });
            return Reply::line("1");
        }

        if !self.store.set_expiry(key, Some(expires_at)) {
            return Reply::line("0");
        }
        Self::flush_direct(self.journal.append_expire(key, expires_at), Reply::line("1"))
    }

    fn cmd_ttl(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::wrong_arity("TTL");
        }
        self.metrics.record_get();
        Reply::line(match self.read_ttl(args[0], Utc::now()) {
            Ttl::NoKey => "-2".to_owned(),
            Ttl::NoTtl => "-1".to_owned(),
            Ttl::Millis(ms) => ms.to_string(),
        })
    }

    fn cmd_persist(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::wrong_arity("PERSIST");
        }
        let key = args[0];
        self.metrics.record_persist();

        if let Some(buffer) = self.txn.as_mut() {
            if let Some(op) = buffer.op_mut(key) {
                let cleared = match op {
                    WriteOp::Del | WriteOp::Persist => false,
                    // A queued Set carries no expiry of its own; its
                    // commit-time SET clears the stored one.
                    WriteOp::Set { .. } => {
                        self.store.entry(key).is_some_and(|e| e.expires_at.is_some())
                    }
                    WriteOp::Expire { .. } => {
                        *op = WriteOp::Persist;
                        true
                    }
                };
                return Reply::line(if cleared { "1" } else { "0" });
            }

            let has_expiry = self.store.entry(key).is_some_and(|e| e.expires_at.is_some());
            if has_expiry {
                buffer.queue(key, WriteOp::Persist);
            }
            return Reply::line(if has_expiry { "1" } else { "0" });
        }

        let has_expiry = self.store.entry(key).is_some_and(|e| e.expires_at.is_some());
        if !has_expiry {
            return Reply::line("0");
        }
        self.store.set_expiry(key, None);
        Self::flush_direct(self.journal.append_persist(key), Reply::line("1"))
    }

    fn cmd_range(&mut self, args: &[&str]) -> Reply {
        if args.len() < 2 {
            return Reply::wrong_arity("RANGE");
        }
        self.metrics.record_range();

        let start = range_bound(args[0]);
        let end = range_bound(args[1]);
        let mut lines = self.read_range(start, end, Utc::now());
        lines.push("END".to_owned());
        Reply::Lines(lines)
    }

    fn cmd_begin(&mut self) -> Reply {
        if self.txn.is_some() {
            return Reply::err("transaction already in progress");
        }
        self.txn = Some(TxnBuffer::new());
        Reply::ok()
    }

    fn cmd_commit(&mut self) -> Reply {
        // Consuming the buffer up front ends the transaction even if an
        // append fails partway through the flush.
        let Some(buffer) = self.txn.take() else {
            return Reply::err("no transaction in progress");
        };
        self.metrics.record_commit();

        match self.apply_buffer(buffer) {
            Ok(()) => Reply::ok(),
            Err(e) => {
                log::error!("commit flush failed: {e}");
                Reply::err("write failed")
            }
        }
    }

    fn cmd_abort(&mut self) -> Reply {
        if self.txn.take().is_none() {
            return Reply::err("no transaction in progress");
        }
        self.metrics.record_abort();
        Reply::ok()
    }

    /// Flush queued ops to the store and the log. Ops are per-key
    /// independent, so application order between keys is immaterial.
    /// A failed append stops the flush; ops already applied stay.
    fn apply_buffer(&mut self, buffer: TxnBuffer) -> Result<()> {
        for (key, op) in buffer.into_writes() {
            match op {
                WriteOp::Set { value } => {
                    self.store.set(key.clone(), value.clone(), None);
                    self.journal.append_set(&key, &value)?;
                }
                WriteOp::Del => {
                    self.store.del(&key);
                    self.journal.append_del(&key)?;
                }
                WriteOp::Expire { expires_at } => {
                    if self.store.set_expiry(&key, Some(expires_at)) {
                        self.journal.append_expire(&key, expires_at)?;
                    }
                }
                WriteOp::Persist => {
                    if self.store.set_expiry(&key, None) {
                        self.journal.append_persist(&key)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Value visible for `key`: the transaction overlay first, then the
    /// store with its own expiry rules. A queued Persist overrides the
    /// store's expiry, so its value is read raw.
    fn read_value(&self, key: &str, now: DateTime<Utc>) -> Option<&str> {
        if let Some(buffer) = &self.txn {
            match buffer.op(key) {
                Some(WriteOp::Set { value }) => return Some(value),
                Some(WriteOp::Del) => return None,
                Some(WriteOp::Persist) => {
                    return self.store.entry(key).map(|entry| entry.value.as_str());
                }
                _ => {}
            }
        }
        self.store.get(key, now).map(|entry| entry.value.as_str())
    }

    /// Presence of `key` through the overlay. A queued Expire counts as
    /// present even though the value still lives in the store; a queued
    /// Persist counts as present whenever the store holds the entry,
    /// expired or not.
    fn key_exists(&self, key: &str, now: DateTime<Utc>) -> bool {
        if let Some(buffer) = &self.txn {
            match buffer.op(key) {
                Some(WriteOp::Set { .. }) | Some(WriteOp::Expire { .. }) => return true,
                Some(WriteOp::Del) => return false,
                Some(WriteOp::Persist) => return self.store.entry(key).is_some(),
                None => {}
            }
        }
        self.store.get(key, now).is_some()
    }

    /// Remaining TTL through the overlay.
    fn read_ttl(&self, key: &str, now: DateTime<Utc>) -> Ttl {
        if let Some(buffer) = &self.txn {
            match buffer.op(key) {
                Some(WriteOp::Del) => return Ttl::NoKey,
                Some(WriteOp::Set { .. }) | Some(WriteOp::Persist) => return Ttl::NoTtl,
                Some(WriteOp::Expire { expires_at }) => {
                    return Ttl::Millis((*expires_at - now).num_milliseconds().max(0));
                }
                None => {}
            }
        }
        self.store.remaining_ttl(key, now)
    }

    /// Live keys within the inclusive bounds, merged with the overlay:
    /// buffered keys join or leave the result by the same presence
    /// predicate EXISTS uses.
    fn read_range(&self, start: Option<&str>, end: Option<&str>, now: DateTime<Utc>) -> Vec<String> {
        let mut keys: std::collections::BTreeSet<String> =
            self.store.range(start, end, now).into_iter().collect();

        if let Some(buffer) = &self.txn {
            for key in buffer.keys() {
                if start.is_some_and(|lo| key.as_str() < lo)
                    || end.is_some_and(|hi| key.as_str() > hi)
                {
                    continue;
                }
                if self.key_exists(key, now) {
                    keys.insert(key.clone());
                } else {
                    keys.remove(key.as_str());
                }
            }
        }
        keys.into_iter().collect()
    }

    fn flush_direct(result: Result<()>, ok: Reply) -> Reply {
        match result {
            Ok(()) => ok,
            Err(e) => {
                log::error!("command log append failed: {e}");
                Reply::err("write failed")
            }
        }
    }
}

/// The literal token `""` denotes an unbounded side of a RANGE.
fn range_bound(token: &str) -> Option<&str> {
    (token != "\"\"").then_some(token)
}
