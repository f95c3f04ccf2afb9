//! Order book snapshots.
//!
//! The exchange publishes the top `TOP_LEVEL_COUNT` price levels of each
//! side. A level with price zero (or volume zero) is empty; an empty first
//! level means there is no market on that side.

use serde::{Deserialize, Serialize};

use crate::market::Instrument;
use crate::price::Price;

/// Number of price levels carried by each book update.
pub const TOP_LEVEL_COUNT: usize = 5;

/// One side of a book update: parallel price and volume arrays, best first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevels {
    pub prices: [Price; TOP_LEVEL_COUNT],
    pub volumes: [u64; TOP_LEVEL_COUNT],
}

impl BookLevels {
    pub fn new(prices: [Price; TOP_LEVEL_COUNT], volumes: [u64; TOP_LEVEL_COUNT]) -> Self {
        Self { prices, volumes }
    }

    /// Best level as `(price, volume)`, or `None` when the side is empty.
    pub fn best(&self) -> Option<(Price, u64)> {
        self.level(0)
    }

    /// Level `i` as `(price, volume)`, or `None` when it is empty.
    pub fn level(&self, i: usize) -> Option<(Price, u64)> {
        let price = *self.prices.get(i)?;
        let volume = *self.volumes.get(i)?;
        if price.is_zero() || volume == 0 {
            return None;
        }
        Some((price, volume))
    }

    /// Best price of everybody else on this side.
    ///
    /// `own` is our resting order on this side as `(price, remaining volume)`.
    /// If the best level holds nothing but our order, the next level is the
    /// competitor's best.
    pub fn best_excluding(&self, own: Option<(Price, u64)>) -> Option<Price> {
        let (best_price, best_volume) = self.best()?;
        match own {
            Some((own_price, own_volume)) if own_price == best_price && best_volume <= own_volume => {
                self.level(1).map(|(price, _)| price)
            }
            _ => Some(best_price),
        }
    }
}

/// Best bid/ask of one instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid_price: Price,
    pub bid_volume: u64,
    pub ask_price: Price,
    pub ask_volume: u64,
}

impl TopOfBook {
    /// Best bid, or `None` when there is no bid market.
    pub fn bid(&self) -> Option<(Price, u64)> {
        (self.bid_price.is_positive() && self.bid_volume > 0)
            .then_some((self.bid_price, self.bid_volume))
    }

    /// Best ask, or `None` when there is no ask market.
    pub fn ask(&self) -> Option<(Price, u64)> {
        (self.ask_price.is_positive() && self.ask_volume > 0)
            .then_some((self.ask_price, self.ask_volume))
    }
}

/// Most recent book update for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub instrument: Instrument,
    pub sequence: u64,
    pub asks: BookLevels,
    pub bids: BookLevels,
}

impl BookSnapshot {
    pub fn new(instrument: Instrument, sequence: u64, asks: BookLevels, bids: BookLevels) -> Self {
        Self {
            instrument,
            sequence,
            asks,
            bids,
        }
    }

    /// Best bid/ask. Empty sides come back as zero price and volume.
    pub fn top(&self) -> TopOfBook {
        TopOfBook {
            bid_price: self.bids.prices[0],
            bid_volume: self.bids.volumes[0],
            ask_price: self.asks.prices[0],
            ask_volume: self.asks.volumes[0],
        }
    }
}
