//! ember - Durable Ordered Key-Value Store
//!
//! An embeddable, single-process, single-writer ordered key-value store
//! with an append-only command log, key expiry, and a single interactive
//! transaction.
//!
//! ## Features
//! - **Command log**: every committed mutation is appended as a text
//!   record and fsynced before the caller sees a response
//! - **Crash recovery**: replaying the log from an empty store rebuilds
//!   the live state
//! - **Ordered store**: keys kept in lexicographic byte order, with
//!   inclusive range enumeration
//! - **TTL support**: Redis-like key expiry, observed lazily at read time
//! - **Transactions**: BEGIN/COMMIT/ABORT with read-your-writes
//!   isolation and all-or-nothing commit
//! - **Metrics**: lock-free atomic counters for observability
//!
//! ## Example
//! ```no_run
//! use ember::{config::Config, engine::Engine};
//!
//! let config = Config::default();
//! let mut engine = Engine::open(config).unwrap();
//!
//! assert_eq!(engine.execute("SET greeting hello").into_lines(), ["OK"]);
//! assert_eq!(engine.execute("GET greeting").into_lines(), ["hello"]);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;
