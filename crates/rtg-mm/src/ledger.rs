//! Live ETF order bookkeeping.
//!
//! Every quote we inserted and have not yet seen a terminal update for,
//! including quotes whose cancel is still in flight. Used to attribute fills
//! to a side and to count volume that could still trade.

use std::collections::HashMap;

use rtg_core::{OrderId, Price, Side};

/// A live order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveOrder {
    pub side: Side,
    pub price: Price,
    pub remaining: u64,
    /// Cumulative fees reported for this order.
    pub fees: i64,
}

/// Live orders keyed by id.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: HashMap<OrderId, LiveOrder>,
    /// Fees already seen for orders that finished on a fill, kept until the
    /// final status update for that order arrives.
    closed_fees: HashMap<OrderId, i64>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: OrderId, side: Side, price: Price, volume: u64) {
        self.orders.insert(
            id,
            LiveOrder {
                side,
                price,
                remaining: volume,
                fees: 0,
            },
        );
    }

    pub fn get(&self, id: OrderId) -> Option<&LiveOrder> {
        self.orders.get(&id)
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.orders.contains_key(&id)
    }

    /// Apply a fill. Returns the order after the fill.
    pub fn record_fill(&mut self, id: OrderId, volume: u64) -> Option<LiveOrder> {
        let order = self.orders.get_mut(&id)?;
        order.remaining = order.remaining.saturating_sub(volume);
        Some(*order)
    }

    /// Overwrite remaining volume (status update or amend).
    pub fn set_remaining(&mut self, id: OrderId, remaining: u64) {
        if let Some(order) = self.orders.get_mut(&id) {
            order.remaining = remaining;
        }
    }

    /// Record the cumulative fees of a status update. Returns the change
    /// since the previous update for this order.
    pub fn record_fees(&mut self, id: OrderId, cumulative: i64) -> i64 {
        if let Some(order) = self.orders.get_mut(&id) {
            let delta = cumulative - order.fees;
            order.fees = cumulative;
            return delta;
        }
        match self.closed_fees.remove(&id) {
            Some(seen) => cumulative - seen,
            None => 0,
        }
    }

    /// Remove a finished order.
    pub fn remove(&mut self, id: OrderId) -> Option<LiveOrder> {
        let order = self.orders.remove(&id)?;
        self.closed_fees.insert(id, order.fees);
        Some(order)
    }

    /// Remaining volume of all live orders on `side`, except `excluding`.
    pub fn outstanding(&self, side: Side, excluding: Option<OrderId>) -> u64 {
        self.orders
            .iter()
            .filter(|(id, order)| order.side == side && Some(**id) != excluding)
            .map(|(_, order)| order.remaining)
            .sum()
    }

    /// Iterate over live orders.
    pub fn iter(&self) -> impl Iterator<Item = (&OrderId, &LiveOrder)> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
