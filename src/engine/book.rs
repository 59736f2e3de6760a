//! The in-memory two-sided price-time-priority book.

use super::error::BookError;
use super::level::PriceLevel;
use super::order::{Order, OrderId, Side};
use std::collections::{BTreeMap, HashMap};

/// Where an order currently lives, for O(1) cancel/modify lookup.
#[derive(Debug, Clone, Copy)]
struct Handle {
    side: Side,
    price: i64,
}

/// Two price-indexed queues (bids, asks) plus an order-id index.
///
/// Bids are iterated best-first as the highest key of the bid map; asks are
/// iterated best-first as the lowest key of the ask map. An order-id index
/// (`handles`) gives O(1) lookup of which side/price an order lives at, so
/// `cancel`/`modify` never need to scan both sides.
#[derive(Debug, Default)]
pub struct Book {
    bids: BTreeMap<i64, PriceLevel>,
    asks: BTreeMap<i64, PriceLevel>,
    orders: HashMap<OrderId, Order>,
    handles: HashMap<OrderId, Handle>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    fn side_map(&mut self, side: Side) -> &mut BTreeMap<i64, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    fn side_map_ref(&self, side: Side) -> &BTreeMap<i64, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Insert a new live order. Fails if `order.id` is already live.
    pub fn insert(&mut self, order: Order) -> Result<(), BookError> {
        if self.handles.contains_key(&order.id) {
            return Err(BookError::AlreadyLive(order.id));
        }
        let id = order.id;
        let side = order.side;
        let price = order.price;
        self.side_map(side)
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .push_back(id);
        self.handles.insert(id, Handle { side, price });
        self.orders.insert(id, order);
        Ok(())
    }

    /// Remove a live order from the book (cancel, or full-fill removal).
    /// Drops the price level if it becomes empty. Returns the removed order.
    pub fn remove(&mut self, id: OrderId) -> Result<Order, BookError> {
        let handle = self
            .handles
            .remove(&id)
            .ok_or(BookError::UnknownOrder(id))?;
        let map = self.side_map(handle.side);
        if let Some(level) = map.get_mut(&handle.price) {
            level.remove(id);
            if level.is_empty() {
                map.remove(&handle.price);
            }
        }
        self.orders.remove(&id).ok_or(BookError::UnknownOrder(id))
    }

    /// Re-seat an order at `new_price` with a fresh `arrival_seq`. Equivalent
    /// to cancel-then-insert, preserving `id`/`original_qty`/`traded_qty`.
    pub fn modify(
        &mut self,
        id: OrderId,
        new_price: i64,
        new_arrival_seq: u64,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), BookError> {
        let mut order = self.remove(id)?;
        order.reprice(new_price, new_arrival_seq, now);
        self.insert(order).expect("id just removed, cannot collide");
        Ok(())
    }

    /// The best order on `side` (head of the best price level), if any.
    pub fn best(&self, side: Side) -> Option<&Order> {
        let map = self.side_map_ref(side);
        let (_, level) = match side {
            Side::Buy => map.iter().next_back(),
            Side::Sell => map.iter().next(),
        }?;
        let id = level.front()?;
        self.orders.get(&id)
    }

    pub fn best_price(&self, side: Side) -> Option<i64> {
        self.best(side).map(|o| o.price)
    }

    /// Apply a fill of `qty` at `price` to the resting order `id` (the head
    /// of its price level). If the order is fully filled, it is removed
    /// from the book. `id` must currently be live.
    pub fn fill_resting(
        &mut self,
        id: OrderId,
        qty: i64,
        price: i64,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Order, BookError> {
        let order = self
            .orders
            .get_mut(&id)
            .ok_or(BookError::UnknownOrder(id))?;
        order.apply_fill(qty, price, now);
        let filled = order.remaining() == 0;
        let snapshot = order.clone();
        if filled {
            self.remove(id)?;
        }
        Ok(snapshot)
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn is_live(&self, id: OrderId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn bid_levels(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.bids.iter().rev().map(|(&price, level)| {
            let qty: i64 = level
                .iter()
                .filter_map(|id| self.orders.get(&id))
                .map(|o| o.remaining())
                .sum();
            (price, qty)
        })
    }

    pub fn ask_levels(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.asks.iter().map(|(&price, level)| {
            let qty: i64 = level
                .iter()
                .filter_map(|id| self.orders.get(&id))
                .map(|o| o.remaining())
                .sum();
            (price, qty)
        })
    }

    /// No live bid at or above a live ask. Checked after every completed
    /// request; violation is an unrecoverable invariant failure upstream.
    pub fn is_crossed(&self) -> bool {
        match (self.best_price(Side::Buy), self.best_price(Side::Sell)) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }
}
