//! The Matching Engine: sequential request dispatch over the Book and WAL.

pub mod book;
pub mod error;
pub mod level;
pub mod matching;
pub mod order;
pub mod request;
pub mod snapshot;
pub mod trade;

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::events::{EngineEvent, EventEmitter, TradeEvent};
use crate::wal::{Wal, WalPayload};

pub use book::Book;
pub use error::{BookError, EngineError, ValidationError};
pub use order::{Order, OrderId, OrderStatus, Side};
pub use request::{EngineAck, IngressRequest, RequestId, RequestOp};
pub use snapshot::DEFAULT_SNAPSHOT_DEPTH;
pub use trade::{Trade, TradeId};

/// Tuning knobs for one engine instance. No file-based config loader is
/// part of this crate; the embedding binary constructs this directly.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub snapshot_depth: usize,
    pub idempotence_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_depth: DEFAULT_SNAPSHOT_DEPTH,
            idempotence_cache_size: 10_000,
        }
    }
}

/// Bounded recent-request-id cache for idempotent re-delivery handling.
struct IdempotenceCache {
    order: VecDeque<RequestId>,
    acks: HashMap<RequestId, EngineAck>,
    capacity: usize,
}

impl IdempotenceCache {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            acks: HashMap::new(),
            capacity,
        }
    }

    fn get(&self, id: RequestId) -> Option<&EngineAck> {
        self.acks.get(&id)
    }

    fn insert(&mut self, ack: EngineAck) {
        let id = ack.request_id();
        if self.acks.contains_key(&id) {
            return;
        }
        self.order.push_back(id);
        self.acks.insert(id, ack);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.acks.remove(&oldest);
            }
        }
    }
}

/// The single-threaded Matching Engine for one instrument.
///
/// One instance owns exactly one [`Book`] and one WAL. Running two engine
/// instances over the same WAL directory is undefined behavior; scale out
/// by instrument, not by sharing a book across instances.
pub struct Engine<W: Wal> {
    book: Book,
    wal: W,
    emitter: EventEmitter,
    arrival_seq: u64,
    lsn: u64,
    idempotence: IdempotenceCache,
    config: EngineConfig,
}

impl<W: Wal> Engine<W> {
    /// Construct an engine over an already-recovered `wal`/`book` pair and
    /// the corresponding high-water marks, as produced by
    /// [`crate::recovery::recover`].
    pub fn from_recovered(
        wal: W,
        book: Book,
        lsn: u64,
        arrival_seq: u64,
        config: EngineConfig,
    ) -> Self {
        Self {
            book,
            wal,
            emitter: EventEmitter::default(),
            arrival_seq,
            lsn,
            idempotence: IdempotenceCache::new(config.idempotence_cache_size),
            config,
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.emitter.subscribe()
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn lsn(&self) -> u64 {
        self.lsn
    }

    /// Emit a depth snapshot of the current book state tagged at the
    /// current LSN. Called by the 1 Hz cadence timer and once after
    /// recovery. Snapshots are never written to the WAL.
    pub fn emit_snapshot(&self) {
        let snap = snapshot::build_snapshot(&self.book, self.lsn, self.config.snapshot_depth);
        self.emitter.publish(EngineEvent::Snapshot(snap));
    }

    /// Process one ingress request to completion. No other request may be
    /// in flight concurrently; the caller (a single dispatch loop) must
    /// enforce that, per the single-writer discipline.
    #[instrument(skip(self, req), fields(request_id = ?req.request_id))]
    pub fn process(&mut self, req: IngressRequest) -> Result<EngineAck, EngineError> {
        if let Some(ack) = self.idempotence.get(req.request_id) {
            return Ok(ack.clone());
        }

        let ack = match self.validate(&req) {
            Err(e) => {
                let ack = EngineAck::Rejected {
                    request_id: req.request_id,
                    reason: e.to_string(),
                };
                self.idempotence.insert(ack.clone());
                return Ok(ack);
            }
            Ok(()) => self.apply(req.clone())?,
        };

        self.idempotence.insert(ack.clone());
        Ok(ack)
    }

    fn validate(&self, req: &IngressRequest) -> Result<(), ValidationError> {
        match &req.op {
            RequestOp::Insert { id, price_paise, qty, .. } => {
                if *price_paise <= 0 {
                    return Err(ValidationError::NonPositivePrice(*price_paise));
                }
                if *qty <= 0 {
                    return Err(ValidationError::NonPositiveQty(*qty));
                }
                if let Some(id) = id {
                    if self.book.is_live(*id) {
                        return Err(ValidationError::DuplicateInsert(*id));
                    }
                }
                Ok(())
            }
            RequestOp::Modify { id, price_paise } => {
                if *price_paise <= 0 {
                    return Err(ValidationError::NonPositivePrice(*price_paise));
                }
                if !self.book.is_live(*id) {
                    return Err(ValidationError::OrderNotLive(*id));
                }
                Ok(())
            }
            RequestOp::Cancel { id } => {
                if !self.book.is_live(*id) {
                    return Err(ValidationError::OrderNotLive(*id));
                }
                Ok(())
            }
        }
    }

    fn next_lsn_payload(&mut self, payload: WalPayload) -> Result<u64, EngineError> {
        let lsn = self.wal.append(payload)?;
        self.lsn = lsn;
        Ok(lsn)
    }

    fn apply(&mut self, req: IngressRequest) -> Result<EngineAck, EngineError> {
        let now = Utc::now();
        let mut trades_to_emit: Vec<(u64, Trade)> = Vec::new();

        match req.op {
            RequestOp::Insert { id, side, price_paise, qty } => {
                self.arrival_seq += 1;
                let order_id = id.unwrap_or_default();
                let mut order =
                    Order::new(order_id, side, price_paise, qty, self.arrival_seq, now);

                self.next_lsn_payload(WalPayload::OrderInsert {
                    order: order.clone(),
                })?;

                let outcome = matching::run(&mut self.book, &mut order, now);
                if !outcome.wal_payloads.is_empty() {
                    let lsns = self.wal.append_batch(outcome.wal_payloads)?;
                    self.lsn = *lsns.last().unwrap_or(&self.lsn);
                    for (i, trade) in outcome.trades.into_iter().enumerate() {
                        trades_to_emit.push((lsns[i * 3], trade));
                    }
                }

                if !outcome.aggressor_filled {
                    self.book.insert(order)?;
                }
            }
            RequestOp::Modify { id, price_paise } => {
                self.arrival_seq += 1;
                self.next_lsn_payload(WalPayload::OrderModify {
                    id,
                    new_price: price_paise,
                    new_arrival_seq: self.arrival_seq,
                })?;

                // Re-seating at a new price forfeits time priority, then
                // the re-seated order runs the matching loop exactly as a
                // fresh insert would, since its new price may now cross.
                let mut order = self.book.remove(id)?;
                order.reprice(price_paise, self.arrival_seq, now);

                let outcome = matching::run(&mut self.book, &mut order, now);
                if !outcome.wal_payloads.is_empty() {
                    let lsns = self.wal.append_batch(outcome.wal_payloads)?;
                    self.lsn = *lsns.last().unwrap_or(&self.lsn);
                    for (i, trade) in outcome.trades.into_iter().enumerate() {
                        trades_to_emit.push((lsns[i * 3], trade));
                    }
                }
                if !outcome.aggressor_filled {
                    self.book.insert(order)?;
                }
            }
            RequestOp::Cancel { id } => {
                self.next_lsn_payload(WalPayload::OrderCancel { id })?;
                let mut order = self.book.remove(id)?;
                order.cancel(now);
            }
        }

        if self.book.is_crossed() {
            return Err(EngineError::InvariantViolation(
                "book crossed after completed request".into(),
            ));
        }

        for (lsn, trade) in trades_to_emit {
            self.emitter.publish(EngineEvent::Trade(TradeEvent {
                lsn,
                trade_id: trade.id,
                ts: trade.timestamp,
                price_paise: trade.price,
                qty: trade.qty,
                bid_order_id: trade.bid_order_id,
                ask_order_id: trade.ask_order_id,
            }));
        }

        info!(lsn = self.lsn, "request applied");
        Ok(EngineAck::Ok {
            request_id: req.request_id,
        })
    }
}

impl<W: Wal> Drop for Engine<W> {
    fn drop(&mut self) {
        warn!("engine shutting down, in-flight request (if any) already flushed");
    }
}
