//! Inbound callbacks and outbound requests.
//!
//! `Event` is everything the exchange gateway can deliver to the
//! controller; `Command` is everything the controller can ask of it.
//! Both serialize as JSON objects tagged by a `type` field, which is the
//! line format used by the replay driver.

use serde::{Deserialize, Serialize};

use crate::book::{BookLevels, BookSnapshot, TOP_LEVEL_COUNT};
use crate::market::Instrument;
use crate::order::{Lifespan, OrderId, Side};
use crate::price::Price;

/// Callback delivered by the exchange gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Top-of-book update. Per tick the future arrives before the ETF.
    OrderBook {
        instrument: Instrument,
        sequence: u64,
        ask_prices: [Price; TOP_LEVEL_COUNT],
        ask_volumes: [u64; TOP_LEVEL_COUNT],
        bid_prices: [Price; TOP_LEVEL_COUNT],
        bid_volumes: [u64; TOP_LEVEL_COUNT],
    },
    /// Aggregated trades since the previous tick.
    TradeTicks {
        instrument: Instrument,
        sequence: u64,
        ask_prices: [Price; TOP_LEVEL_COUNT],
        ask_volumes: [u64; TOP_LEVEL_COUNT],
        bid_prices: [Price; TOP_LEVEL_COUNT],
        bid_volumes: [u64; TOP_LEVEL_COUNT],
    },
    /// One of our ETF orders traded.
    OrderFilled {
        order_id: OrderId,
        price: Price,
        volume: u64,
    },
    /// Status of one of our ETF orders. Zero remaining volume is terminal.
    OrderStatus {
        order_id: OrderId,
        fill_volume: u64,
        remaining_volume: u64,
        fees: i64,
    },
    /// One of our hedge orders traded.
    HedgeFilled {
        order_id: OrderId,
        average_price: Price,
        volume: u64,
    },
    /// Rejection or other problem. `order_id` zero means not order-specific.
    Error { order_id: OrderId, message: String },
    /// Connection lost. Nothing follows.
    Disconnect,
}

impl Event {
    /// Build an order book event from a snapshot.
    pub fn order_book(snapshot: &BookSnapshot) -> Self {
        Self::OrderBook {
            instrument: snapshot.instrument,
            sequence: snapshot.sequence,
            ask_prices: snapshot.asks.prices,
            ask_volumes: snapshot.asks.volumes,
            bid_prices: snapshot.bids.prices,
            bid_volumes: snapshot.bids.volumes,
        }
    }

    /// Snapshot carried by an order book or trade ticks event.
    pub fn snapshot(&self) -> Option<BookSnapshot> {
        match self {
            Self::OrderBook {
                instrument,
                sequence,
                ask_prices,
                ask_volumes,
                bid_prices,
                bid_volumes,
            }
            | Self::TradeTicks {
                instrument,
                sequence,
                ask_prices,
                ask_volumes,
                bid_prices,
                bid_volumes,
            } => Some(BookSnapshot::new(
                *instrument,
                *sequence,
                BookLevels::new(*ask_prices, *ask_volumes),
                BookLevels::new(*bid_prices, *bid_volumes),
            )),
            _ => None,
        }
    }

    /// Stable name, used for logging and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderBook { .. } => "order_book",
            Self::TradeTicks { .. } => "trade_ticks",
            Self::OrderFilled { .. } => "order_filled",
            Self::OrderStatus { .. } => "order_status",
            Self::HedgeFilled { .. } => "hedge_filled",
            Self::Error { .. } => "error",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Request sent to the exchange gateway. Fire-and-forget: the outcome
/// comes back later as an [`Event`] carrying the same order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// New ETF order.
    Insert {
        order_id: OrderId,
        side: Side,
        price: Price,
        volume: u64,
        lifespan: Lifespan,
    },
    /// Cancel a resting ETF order.
    Cancel { order_id: OrderId },
    /// Reduce the volume of a resting ETF order in place.
    Amend { order_id: OrderId, volume: u64 },
    /// Future order offsetting ETF exposure.
    Hedge {
        order_id: OrderId,
        side: Side,
        price: Price,
        volume: u64,
    },
}

impl Command {
    /// Stable name, used for logging and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Cancel { .. } => "cancel",
            Self::Amend { .. } => "amend",
            Self::Hedge { .. } => "hedge",
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            Self::Insert { order_id, .. }
            | Self::Cancel { order_id }
            | Self::Amend { order_id, .. }
            | Self::Hedge { order_id, .. } => *order_id,
        }
    }
}
