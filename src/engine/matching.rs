//! The sequential price-time-priority matching loop.

use chrono::{DateTime, Utc};

use super::book::Book;
use super::order::{Order, Side};
use super::trade::{Trade, TradeId};
use crate::wal::WalPayload;

/// Whether aggressor `a` crosses into resting order `r`.
///
/// A buy crosses when its price is at or above the resting ask; a sell
/// crosses when its price is at or below the resting bid.
fn crosses(a: &Order, r: &Order) -> bool {
    match a.side {
        Side::Buy => a.price >= r.price,
        Side::Sell => a.price <= r.price,
    }
}

/// Outcome of running the matching loop for one aggressor.
pub struct MatchOutcome {
    /// Trades produced, in execution order.
    pub trades: Vec<Trade>,
    /// WAL payloads to append, in the order they must be durable:
    /// one `Trade` + two `OrderUpdate`s per fill.
    pub wal_payloads: Vec<WalPayload>,
    /// `true` if the aggressor was fully filled and must not be inserted.
    pub aggressor_filled: bool,
}

/// Walk `aggressor` against the opposite side of `book`, producing trades
/// at the resting order's price until the aggressor is exhausted or the
/// book no longer crosses. Does not insert the aggressor; the caller
/// inserts it afterward if `!aggressor_filled`.
pub fn run(book: &mut Book, aggressor: &mut Order, now: DateTime<Utc>) -> MatchOutcome {
    let opposite = aggressor.side.opposite();
    let mut trades = Vec::new();
    let mut wal_payloads = Vec::new();

    while aggressor.remaining() > 0 {
        let Some(resting) = book.best(opposite) else {
            break;
        };
        if !crosses(aggressor, resting) {
            break;
        }

        let resting_id = resting.id;
        let resting_price = resting.price;
        let qty = aggressor.remaining().min(resting.remaining());

        let (bid_id, ask_id) = match aggressor.side {
            Side::Buy => (aggressor.id, resting_id),
            Side::Sell => (resting_id, aggressor.id),
        };

        aggressor.apply_fill(qty, resting_price, now);
        let updated_resting = book
            .fill_resting(resting_id, qty, resting_price, now)
            .expect("resting order was just observed live");

        let trade = Trade {
            id: TradeId::new(),
            bid_order_id: bid_id,
            ask_order_id: ask_id,
            price: resting_price,
            qty,
            timestamp: now,
        };

        wal_payloads.push(WalPayload::Trade {
            trade: trade.clone(),
        });
        wal_payloads.push(WalPayload::OrderUpdate {
            id: aggressor.id,
            traded_qty: aggressor.traded_qty,
            notional: aggressor.notional,
            status: aggressor.status,
        });
        wal_payloads.push(WalPayload::OrderUpdate {
            id: updated_resting.id,
            traded_qty: updated_resting.traded_qty,
            notional: updated_resting.notional,
            status: updated_resting.status,
        });

        trades.push(trade);
    }

    MatchOutcome {
        trades,
        wal_payloads,
        aggressor_filled: aggressor.remaining() == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::order::OrderId;

    fn resting(side: Side, price: i64, qty: i64, seq: u64) -> Order {
        Order::new(OrderId::new(), side, price, qty, seq, Utc::now())
    }

    #[test]
    fn exact_cross_full_fill_both_sides() {
        let mut book = Book::new();
        let s1 = resting(Side::Sell, 10_100, 5, 1);
        let s1_id = s1.id;
        book.insert(s1).unwrap();

        let mut b2 = resting(Side::Buy, 10_100, 5, 2);
        let outcome = run(&mut book, &mut b2, Utc::now());

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].price, 10_100);
        assert_eq!(outcome.trades[0].qty, 5);
        assert_eq!(outcome.trades[0].ask_order_id, s1_id);
        assert!(outcome.aggressor_filled);
        assert!(book.best(Side::Sell).is_none());
    }

    #[test]
    fn partial_fill_aggressor_rests() {
        let mut book = Book::new();
        book.insert(resting(Side::Sell, 10_000, 3, 1)).unwrap();

        let mut b1 = resting(Side::Buy, 10_000, 10, 2);
        let outcome = run(&mut book, &mut b1, Utc::now());

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].qty, 3);
        assert!(!outcome.aggressor_filled);
        assert_eq!(b1.remaining(), 7);
    }

    #[test]
    fn price_time_priority_walks_oldest_first() {
        let mut book = Book::new();
        let s1 = resting(Side::Sell, 10_000, 4, 1);
        let s1_id = s1.id;
        book.insert(s1).unwrap();
        let s2 = resting(Side::Sell, 10_000, 4, 2);
        let s2_id = s2.id;
        book.insert(s2).unwrap();

        let mut b1 = resting(Side::Buy, 10_000, 6, 3);
        let outcome = run(&mut book, &mut b1, Utc::now());

        assert_eq!(outcome.trades.len(), 2);
        assert_eq!(outcome.trades[0].ask_order_id, s1_id);
        assert_eq!(outcome.trades[0].qty, 4);
        assert_eq!(outcome.trades[1].ask_order_id, s2_id);
        assert_eq!(outcome.trades[1].qty, 2);
        assert!(outcome.aggressor_filled);
        assert_eq!(book.get(s2_id).unwrap().remaining(), 2);
    }

    #[test]
    fn no_cross_leaves_both_resting() {
        let mut book = Book::new();
        book.insert(resting(Side::Sell, 10_100, 5, 1)).unwrap();
        let mut b1 = resting(Side::Buy, 10_000, 10, 2);
        let outcome = run(&mut book, &mut b1, Utc::now());
        assert!(outcome.trades.is_empty());
        assert!(!outcome.aggressor_filled);
    }
}
