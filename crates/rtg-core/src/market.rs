//! Instruments and exchange-wide price constants.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::price::Price;

/// Exchange tick size in cents.
pub const TICK_SIZE_IN_CENTS: u64 = 100;

/// Lowest price the exchange accepts on a bid.
pub const MINIMUM_BID: u64 = 1;

/// Highest price the exchange accepts on an ask.
pub const MAXIMUM_ASK: u64 = 2_147_483_647;

/// Lowest on-grid bid price. A sell priced here is always marketable.
pub const MIN_BID_NEAREST_TICK: Price =
    Price::new((MINIMUM_BID + TICK_SIZE_IN_CENTS) / TICK_SIZE_IN_CENTS * TICK_SIZE_IN_CENTS);

/// Highest on-grid ask price. A buy priced here is always marketable.
pub const MAX_ASK_NEAREST_TICK: Price =
    Price::new(MAXIMUM_ASK / TICK_SIZE_IN_CENTS * TICK_SIZE_IN_CENTS);

/// The two tradeable instruments.
///
/// The future leads; the ETF is the instrument we quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Future,
    Etf,
}

impl Instrument {
    /// Stable lowercase name, used for metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Future => "future",
            Self::Etf => "etf",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
