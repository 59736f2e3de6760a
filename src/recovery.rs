//! Startup recovery: rebuild the Book from the WAL before serving requests.

use thiserror::Error;
use tracing::{info, instrument};

use crate::engine::book::Book;
use crate::engine::order::{Order, OrderStatus};
use crate::wal::{Wal, WalError, WalPayload};

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("WAL error during recovery: {0}")]
    Wal(#[from] WalError),
}

/// The result of replaying a WAL from the start: a rebuilt Book plus the
/// high-water marks the live engine must resume counting from.
pub struct RecoveredState {
    pub book: Book,
    pub lsn: u64,
    pub arrival_seq: u64,
}

/// Replay every durable record in `wal` (LSN order, from 1) against a fresh
/// Book, reconstructing exactly the state at the time of the last durable
/// record. A torn tail was already truncated when `wal` was opened; any
/// mid-log corruption surfaces as a hard error here.
#[instrument(skip_all)]
pub fn recover(wal: &impl Wal) -> Result<RecoveredState, RecoveryError> {
    let mut book = Book::new();
    let mut lsn = 0u64;
    let mut arrival_seq = 0u64;

    let records = wal.replay(1)?;
    for (record_lsn, payload) in records {
        lsn = record_lsn;
        apply_record(&mut book, payload, &mut arrival_seq)?;
    }

    info!(lsn, arrival_seq, "WAL replay complete");
    Ok(RecoveredState {
        book,
        lsn,
        arrival_seq,
    })
}

fn apply_record(
    book: &mut Book,
    payload: WalPayload,
    arrival_seq: &mut u64,
) -> Result<(), RecoveryError> {
    match payload {
        WalPayload::OrderInsert { order } => {
            *arrival_seq = (*arrival_seq).max(order.arrival_seq);
            book.insert(order).ok();
        }
        WalPayload::OrderModify {
            id,
            new_price,
            new_arrival_seq,
        } => {
            *arrival_seq = (*arrival_seq).max(new_arrival_seq);
            book.modify(id, new_price, new_arrival_seq, chrono::Utc::now())
                .ok();
        }
        WalPayload::OrderCancel { id } => {
            book.remove(id).ok();
        }
        WalPayload::Trade { .. } => {
            // Informational only: the order-state effect of a trade is
            // replayed entirely via its paired OrderUpdate records.
        }
        WalPayload::OrderUpdate {
            id,
            traded_qty,
            notional,
            status,
        } => {
            if let Some(order) = book.get(id) {
                let mut updated = order.clone();
                updated.traded_qty = traded_qty;
                updated.notional = notional;
                updated.status = status;
                if status == OrderStatus::Filled || status == OrderStatus::Cancelled {
                    book.remove(id).ok();
                } else {
                    replace_order(book, updated);
                }
            }
        }
    }
    Ok(())
}

fn replace_order(book: &mut Book, order: Order) {
    let id = order.id;
    book.remove(id).ok();
    book.insert(order).ok();
}
