//! The canonical book entity and its lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique order identifier, stable across `MODIFY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Generate a fresh random order id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The opposite side, against which a matching loop walks.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    /// Whether an order in this status is live (resting on the book).
    pub fn is_live(self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::PartiallyFilled)
    }
}

/// A resting or historical limit order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: i64,
    pub original_qty: i64,
    pub traded_qty: i64,
    /// Running `Σ(fill_price · fill_qty)`, used to derive `avg_traded_price`
    /// on read without accumulating rounding error across fills.
    pub notional: i64,
    pub status: OrderStatus,
    pub arrival_seq: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Construct a brand-new order fresh off an `INSERT` request.
    pub fn new(
        id: OrderId,
        side: Side,
        price: i64,
        qty: i64,
        arrival_seq: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            side,
            price,
            original_qty: qty,
            traded_qty: 0,
            notional: 0,
            status: OrderStatus::Open,
            arrival_seq,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity remaining to be filled.
    pub fn remaining(&self) -> i64 {
        self.original_qty - self.traded_qty
    }

    /// Weighted-average fill price, `⌊notional / traded_qty⌋`.
    ///
    /// `None` while `traded_qty == 0`, matching the spec's definition that
    /// this field is undefined for an order with no fills.
    pub fn avg_traded_price(&self) -> Option<i64> {
        if self.traded_qty == 0 {
            None
        } else {
            Some(self.notional / self.traded_qty)
        }
    }

    /// Apply a fill of `qty` at `price`, updating `traded_qty`, `notional`,
    /// and `status`. Transitions `OPEN -> PARTIALLY_FILLED`, and forces
    /// `FILLED` once `remaining() == 0`.
    pub fn apply_fill(&mut self, qty: i64, price: i64, now: DateTime<Utc>) {
        debug_assert!(qty > 0 && qty <= self.remaining());
        self.traded_qty += qty;
        self.notional += price * qty;
        self.status = if self.remaining() == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = now;
    }

    /// Re-seat this order at a new price with a fresh arrival sequence,
    /// forfeiting its existing time priority. Used by `MODIFY`.
    pub fn reprice(&mut self, new_price: i64, new_arrival_seq: u64, now: DateTime<Utc>) {
        self.price = new_price;
        self.arrival_seq = new_arrival_seq;
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Cancelled;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new(OrderId::new(), Side::Buy, 10_000, 10, 1, Utc::now())
    }

    #[test]
    fn partial_fill_updates_avg_price() {
        let mut o = order();
        o.apply_fill(4, 10_000, Utc::now());
        assert_eq!(o.status, OrderStatus::PartiallyFilled);
        assert_eq!(o.avg_traded_price(), Some(10_000));
        assert_eq!(o.remaining(), 6);
    }

    #[test]
    fn full_fill_marks_filled() {
        let mut o = order();
        o.apply_fill(10, 9_950, Utc::now());
        assert_eq!(o.status, OrderStatus::Filled);
        assert_eq!(o.remaining(), 0);
    }

    #[test]
    fn weighted_average_floors() {
        let mut o = order();
        o.apply_fill(3, 10, Utc::now());
        o.apply_fill(2, 11, Utc::now());
        // notional = 30 + 22 = 52, traded_qty = 5, 52/5 = 10.4 -> floors to 10
        assert_eq!(o.avg_traded_price(), Some(10));
    }
}
