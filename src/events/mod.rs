//! Broadcast event wire types and the emitter.

mod emitter;

pub use emitter::EventEmitter;

use crate::engine::order::OrderId;
use crate::engine::trade::TradeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A broadcast trade notification, emitted after the trade's WAL records
/// are durable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub lsn: u64,
    pub trade_id: TradeId,
    pub ts: DateTime<Utc>,
    pub price_paise: i64,
    pub qty: i64,
    pub bid_order_id: OrderId,
    pub ask_order_id: OrderId,
}

/// Aggregated depth-per-price-level view of the book, broadcast at a fixed
/// cadence. `bids`/`asks` are sorted best-first and capped at `K` levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub lsn: u64,
    pub ts: DateTime<Utc>,
    pub bids: Vec<(i64, i64)>,
    pub asks: Vec<(i64, i64)>,
}

/// Anything the Event Emitter publishes downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    Trade(TradeEvent),
    Snapshot(SnapshotEvent),
}
