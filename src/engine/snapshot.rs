//! Aggregated depth-per-price-level snapshot construction.

use super::book::Book;
use crate::events::SnapshotEvent;

/// Default number of price levels carried per side in a broadcast snapshot.
pub const DEFAULT_SNAPSHOT_DEPTH: usize = 50;

/// Build a best-first, depth-capped snapshot of `book` tagged at `lsn`.
pub fn build_snapshot(book: &Book, lsn: u64, depth: usize) -> SnapshotEvent {
    SnapshotEvent {
        lsn,
        ts: chrono::Utc::now(),
        bids: book.bid_levels().take(depth).collect(),
        asks: book.ask_levels().take(depth).collect(),
    }
}
