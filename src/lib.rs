//! # ledgerbook
//!
//! A single-instrument limit order book with continuous price-time-priority
//! matching, a write-ahead log for crash recovery, and broadcast trade and
//! snapshot events.
//!
//! ## Design
//!
//! The Matching Engine is strictly single-threaded: exactly one request
//! mutates the book at a time, and a request's matching loop runs to
//! completion without yielding. Every state transition is written to the
//! WAL and flushed before it is observable — acknowledged to the producer,
//! or emitted as a trade event. Scaling is horizontal, one engine per
//! instrument; this crate does not attempt to parallelize a single book.
//!
//! ## Modules
//!
//! - [`money`] — the float-to-paise boundary conversion.
//! - [`engine`] — `Order`, `Trade`, `Book`, the matching loop, and the
//!   `Engine` dispatcher that ties them together.
//! - [`wal`] — the append-only write-ahead log and its on-disk framing.
//! - [`events`] — broadcast wire types and the best-effort event emitter.
//! - [`recovery`] — rebuilding a `Book` from a WAL on startup.

pub mod engine;
pub mod events;
pub mod money;
pub mod prelude;
pub mod recovery;
pub mod utils;
pub mod wal;

pub use engine::{Engine, EngineConfig};
pub use recovery::{recover, RecoveredState};
pub use utils::current_time_millis;
